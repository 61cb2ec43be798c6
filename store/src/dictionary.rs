use std::collections::HashMap;

use colors_transform::Color;
use image::Rgba;

use crate::errors::StoreError;

/// Interns external actor identifiers into dense `u32` ids in first-seen
/// order. Ids are stable for the lifetime of one build.
#[derive(Debug, Default)]
pub struct ActorDictionary {
    ids: HashMap<String, u32>,
    names: Vec<String>,
}

impl ActorDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Result<u32, StoreError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id =
            u32::try_from(self.names.len()).map_err(|_| StoreError::DictionaryFull("actor"))?;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn from_names(names: Vec<String>) -> Self {
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id as u32))
            .collect();
        ActorDictionary { ids, names }
    }
}

/// Interns color hex strings into dense `u16` ids, keeping the reverse
/// mapping for rendering. The hex form is validated when first seen, so a
/// stored color id always resolves.
#[derive(Debug, Default)]
pub struct ColorDictionary {
    ids: HashMap<String, u16>,
    representations: Vec<String>,
    // Vec lookup by index is faster than HashMap lookup by key
    resolved: Vec<Rgba<u8>>,
}

impl ColorDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, representation: &str) -> Result<u16, StoreError> {
        if let Some(&id) = self.ids.get(representation) {
            return Ok(id);
        }
        let id = u16::try_from(self.representations.len())
            .map_err(|_| StoreError::DictionaryFull("color"))?;
        let rgba = parse_rgba(representation)?;
        self.ids.insert(representation.to_string(), id);
        self.representations.push(representation.to_string());
        self.resolved.push(rgba);
        Ok(id)
    }

    pub fn lookup(&self, representation: &str) -> Option<u16> {
        self.ids.get(representation).copied()
    }

    pub fn representation(&self, id: u16) -> Option<&str> {
        self.representations.get(id as usize).map(String::as_str)
    }

    pub fn rgba(&self, id: u16) -> Option<Rgba<u8>> {
        self.resolved.get(id as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.representations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }

    pub(crate) fn representations(&self) -> &[String] {
        &self.representations
    }

    pub(crate) fn from_representations(
        representations: Vec<String>,
    ) -> Result<Self, StoreError> {
        let mut resolved = Vec::with_capacity(representations.len());
        for representation in &representations {
            resolved.push(parse_rgba(representation)?);
        }
        let ids = representations
            .iter()
            .enumerate()
            .map(|(id, representation)| (representation.clone(), id as u16))
            .collect();
        Ok(ColorDictionary {
            ids,
            representations,
            resolved,
        })
    }
}

fn parse_rgba(representation: &str) -> Result<Rgba<u8>, StoreError> {
    let rgb = colors_transform::Rgb::from_hex_str(representation)
        .map_err(|_| StoreError::ColorParse(representation.to_string()))?;
    Ok(Rgba([
        rgb.get_red() as u8,
        rgb.get_green() as u8,
        rgb.get_blue() as u8,
        0xff,
    ]))
}
