mod error;
mod font;
mod layout;
mod raster;
mod shape;
mod template;
mod types;

pub use error::CertPressError;
pub use font::{
    FontCandidateReport, FontClassReport, FontReport, FontResolver, LanguageClass, ResolvedFont,
};
pub use layout::{layout_origin, measure_ink_width};
pub use raster::{composite, decode_background};
pub use shape::{ShapedText, TextShaper};
pub use template::{Template, TemplateStore, TemplateSummary};
pub use types::{Alignment, Color, Point};

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RendererOptions {
    pub font_dir: PathBuf,
    pub shape_text: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            font_dir: PathBuf::from("fonts"),
            shape_text: true,
        }
    }
}

// Stateless apart from the font byte cache, so one instance can serve
// concurrent render calls.
#[derive(Debug)]
pub struct Renderer {
    resolver: FontResolver,
    shaper: TextShaper,
    shape_text: bool,
}

impl Renderer {
    pub fn new(options: RendererOptions) -> Self {
        Self {
            resolver: FontResolver::new(&options.font_dir),
            shaper: TextShaper::new(options.shape_text),
            shape_text: options.shape_text,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RendererOptions::default())
    }

    #[tracing::instrument(skip(self, template), fields(template_id = template.id))]
    pub fn render(&self, template: &Template, name: &str) -> Result<Vec<u8>, CertPressError> {
        let font = self
            .resolver
            .resolve(&template.language, template.font_size as f32);
        let shaped = self.shaper.shape(name, &template.language);
        let origin = layout::layout_origin(
            &font,
            &shaped,
            template.anchor,
            template.alignment,
            self.shape_text,
        );
        raster::composite(
            &template.image,
            &shaped,
            &font,
            origin,
            template.color,
            self.shape_text,
        )
    }

    pub fn font_report(&self) -> FontReport {
        self.resolver.report()
    }
}
