//! The in-memory store of characterized objects and models.
//!
//! Entries are keyed by unique names; objects can be promoted to models by
//! copy. The registry is a plain single-threaded structure for the
//! interactive layer; share it across threads only behind your own lock.

use crate::{model, CharacterizedObject, Error, Model, Result};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// A name-keyed store of objects and models.
#[derive(Debug, Default)]
pub struct Registry {
    objects: BTreeMap<String, CharacterizedObject>,
    models: BTreeMap<String, Model>,
    next_id: u32,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Adds an object under a name, or under a generated `object-N` name.
    ///
    /// Returns the name the object landed under; an explicit name that is
    /// already taken fails with [Error::NameTaken].
    pub fn add_object(
        &mut self,
        name: Option<String>,
        object: CharacterizedObject,
    ) -> Result<String> {
        let name = match name {
            Some(name) => {
                if self.objects.contains_key(&name) {
                    return Err(Error::NameTaken(name));
                }
                name
            }
            None => loop {
                let candidate = format!("object-{}", self.next_id);
                self.next_id += 1;
                if !self.objects.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        info!("registered object {name}");
        self.objects.insert(name.clone(), object);
        Ok(name)
    }

    /// Copies an object into the model store under a new name.
    pub fn promote(&mut self, object_name: &str, model_name: &str) -> Result<()> {
        if self.models.contains_key(model_name) {
            return Err(Error::NameTaken(model_name.to_string()));
        }
        let object = self
            .objects
            .get(object_name)
            .ok_or_else(|| Error::UnknownName(object_name.to_string()))?;
        info!("promoted object {object_name} to model {model_name}");
        self.models.insert(model_name.to_string(), object.clone());
        Ok(())
    }

    /// Returns the object with this name, if any.
    pub fn object(&self, name: &str) -> Option<&CharacterizedObject> {
        self.objects.get(name)
    }

    /// Returns the model with this name, if any.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Returns the stored objects, ordered by name.
    pub fn objects(&self) -> impl Iterator<Item = (&String, &CharacterizedObject)> {
        self.objects.iter()
    }

    /// Returns the stored models, ordered by name.
    pub fn models(&self) -> impl Iterator<Item = (&String, &Model)> {
        self.models.iter()
    }

    /// Saves a stored object to a file.
    pub fn save_object<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<()> {
        self.object(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?
            .save(path)
    }

    /// Loads an object file into the registry under a name.
    pub fn load_object<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        if self.objects.contains_key(name) {
            return Err(Error::NameTaken(name.to_string()));
        }
        let object = CharacterizedObject::load(path)?;
        self.objects.insert(name.to_string(), object);
        Ok(())
    }

    /// Exports a stored object as Livox-Viewer CSV.
    pub fn export_object_csv<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<()> {
        self.object(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?
            .save_livox_csv(path)
    }

    /// Saves a stored model to a file.
    pub fn save_model<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<()> {
        let stored = self
            .model(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?;
        model::save_model(name, stored, path)
    }

    /// Loads a model file into the registry under a name.
    ///
    /// The registry name wins over the one stored in the file.
    pub fn load_model<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        if self.models.contains_key(name) {
            return Err(Error::NameTaken(name.to_string()));
        }
        let (stored_name, loaded) = model::load_model(path)?;
        if stored_name != name {
            info!("model file was saved as {stored_name}, loading as {name}");
        }
        self.models.insert(name.to_string(), loaded);
        Ok(())
    }

    /// Exports a stored model as Livox-Viewer CSV.
    pub fn export_model_csv<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<()> {
        self.model(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?
            .save_livox_csv(path)
    }
}
