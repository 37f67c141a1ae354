use std::path::PathBuf;

use anyhow::{Context, anyhow};
use asciigen::adjust::Adjustments;
use asciigen::app::AsciiApp;
use asciigen::ascii::{Charset, CharsetPreset, Pipeline, RenderSettings};
use asciigen::aspect::{OutputSize, reference_aspect};
use asciigen::editor::CropEditor;
use clap::{Args, Parser, Subcommand};
use eframe::egui;
use log::info;

#[derive(Parser)]
#[command(name = "asciigen", about = "Turn images into ASCII art")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an image without opening the window and print the art
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input image file
    input: PathBuf,
    /// Output width in characters
    #[arg(short, long, default_value = "120")]
    width: u32,
    /// Output height in lines; derived from the width when omitted
    #[arg(short = 'H', long)]
    height: Option<u32>,
    #[arg(long, default_value = "1.0")]
    contrast: f32,
    #[arg(long, default_value = "1.0")]
    brightness: f32,
    /// Invert the image before conversion
    #[arg(short, long)]
    invert: bool,
    /// Charset preset (standard, detailed, blocks, binary)
    #[arg(short, long, default_value = "standard")]
    charset: CharsetPreset,
    /// Custom ramp, lightest character first; overrides --charset
    #[arg(long)]
    ramp: Option<String>,
    /// Crop rectangle in image pixels
    #[arg(long, value_name = "X,Y,W,H", value_parser = parse_crop)]
    crop: Option<CropArg>,
    /// Do not derive the height from the source aspect ratio
    #[arg(long)]
    free: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CropArg {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

fn parse_crop(s: &str) -> Result<CropArg, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        &[x, y, width, height] => Ok(CropArg {
            x,
            y,
            width,
            height,
        }),
        _ => Err(format!("expected X,Y,W,H, got {} values", parts.len())),
    }
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let image = image::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let mut editor = CropEditor::new();
    editor.set_image_bounds(image.width(), image.height());
    let bounds = editor
        .bounds()
        .ok_or_else(|| anyhow!("{} has no pixels", args.input.display()))?;
    if let Some(crop) = args.crop {
        if !editor.set_manual(crop.x, crop.y, crop.width, crop.height) {
            return Err(anyhow!("crop {crop:?} does not overlap the image"));
        }
    }

    let reference = Some(reference_aspect(editor.selection(), bounds));
    let mut output = OutputSize::default();
    output.set_locked(!args.free && args.height.is_none(), reference);
    output.set_width(args.width, reference);
    if let Some(height) = args.height {
        output.set_height(height, reference);
    }

    let mut charset = Charset::default();
    match args.ramp {
        Some(ramp) => charset.edit(ramp),
        None => charset.select(args.charset),
    }

    let adjustments = Adjustments {
        contrast: args.contrast,
        brightness: args.brightness,
        invert: args.invert,
    };
    let settings = RenderSettings {
        crop: editor.crop_box(),
        adjustments: &adjustments,
        width: output.width(),
        height: output.height(),
        ramp: charset.ramp(),
    };
    info!(
        "converting {} to {}x{}",
        args.input.display(),
        settings.width,
        settings.height
    );
    let pipeline: Pipeline = Pipeline::default();
    let art = pipeline.run(&image, &settings)?;
    println!("{art}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Command::Convert(args)) = cli.command {
        return convert(args);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 850.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Asciigen",
        options,
        Box::new(|cc| Ok(Box::new(AsciiApp::new(cc)))),
    )
    .map_err(|e| anyhow!(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_argument_parses_four_numbers() {
        assert_eq!(
            parse_crop("10, 20,300.5,40"),
            Ok(CropArg {
                x: 10.0,
                y: 20.0,
                width: 300.5,
                height: 40.0
            })
        );
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn convert_subcommand_reads_flags() {
        let cli = Cli::try_parse_from([
            "asciigen", "convert", "cat.png", "-w", "80", "--charset", "blocks", "--free",
        ])
        .unwrap();
        let Some(Command::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.width, 80);
        assert_eq!(args.charset, CharsetPreset::Blocks);
        assert!(args.free);
        assert!(args.height.is_none());
    }
}
