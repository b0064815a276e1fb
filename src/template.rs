use crate::error::{self, CertPressError};
use crate::types::{Alignment, Color, Point};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Stored description of one certificate design. `image` holds the
// background as a data URL or bare base64 payload; `font` records the
// requested family for operators but resolution goes by `language`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    #[serde(rename = "image_base64")]
    pub image: String,
    #[serde(rename = "text_position")]
    pub anchor: Point,
    pub font: String,
    pub font_size: u32,
    pub alignment: Alignment,
    pub color: Color,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub id: u32,
    pub name: String,
    pub language: String,
}

#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
    path: Option<PathBuf>,
}

impl TemplateStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    // Missing files start an empty store; unreadable JSON is an error so a
    // bad deployment does not silently wipe existing templates.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CertPressError> {
        let path = path.as_ref().to_path_buf();
        let templates = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| error::store(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            templates,
            path: Some(path),
        })
    }

    pub fn get(&self, id: u32) -> Result<Template, CertPressError> {
        self.templates
            .iter()
            .find(|template| template.id == id)
            .cloned()
            .ok_or(CertPressError::TemplateNotFound(id))
    }

    pub fn insert(&mut self, mut template: Template) -> Result<u32, CertPressError> {
        let id = self
            .templates
            .iter()
            .map(|template| template.id)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        template.id = id;
        self.templates.push(template);
        self.persist()?;
        Ok(id)
    }

    pub fn list(&self) -> Vec<TemplateSummary> {
        let mut summaries: Vec<TemplateSummary> = self
            .templates
            .iter()
            .map(|template| TemplateSummary {
                id: template.id,
                name: template.name.clone(),
                language: template.language.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        summaries
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn persist(&self) -> Result<(), CertPressError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json =
            serde_json::to_vec_pretty(&self.templates).map_err(|err| error::store(err.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}
