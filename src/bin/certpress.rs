use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use certpress::{Alignment, Color, Point, Renderer, RendererOptions, Template, TemplateStore};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "certpress",
    version,
    about = "Render recipient names onto stored certificate templates"
)]
struct Cli {
    /// Template store file
    #[arg(long, default_value = "templates.json")]
    store: PathBuf,

    /// Directory probed for font candidates
    #[arg(long, default_value = "fonts")]
    font_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a template from a background image file
    Add {
        #[arg(long)]
        name: String,

        /// Background image (png or jpeg)
        #[arg(long)]
        image: PathBuf,

        /// Anchor x in pixels
        #[arg(long)]
        x: f32,

        /// Anchor y in pixels
        #[arg(long)]
        y: f32,

        #[arg(long, default_value = "Montserrat")]
        font: String,

        #[arg(long, default_value_t = 48)]
        font_size: u32,

        /// start, center or end (left and right also accepted)
        #[arg(long, default_value = "center")]
        alignment: String,

        /// Fill color as #rrggbb or #rrggbbaa
        #[arg(long, default_value = "#000000")]
        color: String,

        #[arg(long, default_value = "en")]
        language: String,
    },

    /// List stored templates, newest first
    List,

    /// Print one template as JSON with the image payload elided
    Show { id: u32 },

    /// Render a name onto a stored template
    Render {
        id: u32,
        name: String,

        /// Output PNG path
        #[arg(long, default_value = "certificate.png")]
        out: PathBuf,

        /// Skip contextual shaping and bidi reordering
        #[arg(long)]
        no_shaping: bool,
    },

    /// Report font candidate availability per language class
    Fonts,
}

fn parse_alignment(value: &str) -> Result<Alignment> {
    match value.to_ascii_lowercase().as_str() {
        "start" | "left" => Ok(Alignment::Start),
        "center" => Ok(Alignment::Center),
        "end" | "right" => Ok(Alignment::End),
        other => anyhow::bail!("unknown alignment {other:?} (expected start, center or end)"),
    }
}

fn data_url_for(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mime = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            "image/jpeg"
        }
        _ => "image/png",
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Add {
            name,
            image,
            x,
            y,
            font,
            font_size,
            alignment,
            color,
            language,
        } => {
            let alignment = parse_alignment(&alignment)?;
            let fill = Color::from_hex(&color)
                .ok_or_else(|| anyhow::anyhow!("invalid color {color:?} (expected #rrggbb)"))?;
            let mut store = TemplateStore::open(&cli.store)?;
            let id = store.insert(Template {
                id: 0,
                name,
                image: data_url_for(&image)?,
                anchor: Point::new(x, y),
                font,
                font_size,
                alignment,
                color: fill,
                language,
            })?;
            println!("added template {id}");
        }
        Command::List => {
            let store = TemplateStore::open(&cli.store)?;
            println!("{}", serde_json::to_string_pretty(&store.list())?);
        }
        Command::Show { id } => {
            let store = TemplateStore::open(&cli.store)?;
            let mut template = store.get(id)?;
            template.image = format!("<{} bytes>", template.image.len());
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        Command::Render {
            id,
            name,
            out,
            no_shaping,
        } => {
            let store = TemplateStore::open(&cli.store)?;
            let template = store.get(id)?;
            let renderer = Renderer::new(RendererOptions {
                font_dir: cli.font_dir,
                shape_text: !no_shaping,
            });
            let png = renderer.render(&template, &name)?;
            fs::write(&out, &png).with_context(|| format!("write {}", out.display()))?;
            println!("wrote {} ({} bytes)", out.display(), png.len());
        }
        Command::Fonts => {
            let renderer = Renderer::new(RendererOptions {
                font_dir: cli.font_dir,
                shape_text: true,
            });
            println!("{}", serde_json::to_string_pretty(&renderer.font_report())?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_accepts_css_and_legacy_names() {
        assert!(matches!(parse_alignment("start"), Ok(Alignment::Start)));
        assert!(matches!(parse_alignment("LEFT"), Ok(Alignment::Start)));
        assert!(matches!(parse_alignment("center"), Ok(Alignment::Center)));
        assert!(matches!(parse_alignment("Right"), Ok(Alignment::End)));
        assert!(parse_alignment("justify").is_err());
    }

    #[test]
    fn render_args_parse() {
        let cli = Cli::try_parse_from([
            "certpress",
            "--store",
            "s.json",
            "render",
            "3",
            "Ada Lovelace",
            "--out",
            "ada.png",
            "--no-shaping",
        ])
        .unwrap();
        assert_eq!(cli.store, PathBuf::from("s.json"));
        match cli.command {
            Command::Render {
                id,
                name,
                out,
                no_shaping,
            } => {
                assert_eq!(id, 3);
                assert_eq!(name, "Ada Lovelace");
                assert_eq!(out, PathBuf::from("ada.png"));
                assert!(no_shaping);
            }
            _ => panic!("expected render subcommand"),
        }
    }

    #[test]
    fn add_defaults_fill_in() {
        let cli = Cli::try_parse_from([
            "certpress", "add", "--name", "gala", "--image", "bg.png", "--x", "120", "--y", "260",
        ])
        .unwrap();
        match cli.command {
            Command::Add {
                font,
                font_size,
                alignment,
                color,
                language,
                ..
            } => {
                assert_eq!(font, "Montserrat");
                assert_eq!(font_size, 48);
                assert_eq!(alignment, "center");
                assert_eq!(color, "#000000");
                assert_eq!(language, "en");
            }
            _ => panic!("expected add subcommand"),
        }
    }

    #[test]
    fn data_url_mime_follows_extension() {
        let dir = std::env::temp_dir();
        let png = dir.join(format!("certpress-cli-{}.png", std::process::id()));
        let jpg = dir.join(format!("certpress-cli-{}.jpg", std::process::id()));
        fs::write(&png, b"not really an image").unwrap();
        fs::write(&jpg, b"not really an image").unwrap();
        let png_url = data_url_for(&png).unwrap();
        let jpg_url = data_url_for(&jpg).unwrap();
        fs::remove_file(&png).ok();
        fs::remove_file(&jpg).ok();
        assert!(png_url.starts_with("data:image/png;base64,"));
        assert!(jpg_url.starts_with("data:image/jpeg;base64,"));
    }
}
