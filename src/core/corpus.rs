//! Corpus snapshot: every document of one collection, parsed, in storage
//! name order. Engines take a snapshot and return results or a new snapshot;
//! nothing here is shared mutable state.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::LpkitConfig;
use crate::document::Document;
use crate::error::Result;
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct Corpus {
    file_prefix: String,
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(file_prefix: impl Into<String>, mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.storage_name.cmp(&b.storage_name));
        Self {
            file_prefix: file_prefix.into(),
            documents,
        }
    }

    /// Read and parse every document the configuration selects.
    pub fn load<S: Storage + ?Sized>(storage: &S, config: &LpkitConfig) -> Result<Self> {
        let mut documents = Vec::new();

        for name in storage.list()? {
            if !config.is_document_name(&name) {
                continue;
            }
            let raw = storage.read(&name)?;
            documents.push(Document::parse(name, raw));
        }

        log_status!("corpus", "Loaded {} documents", documents.len());

        Ok(Self::new(config.file_prefix.clone(), documents))
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every document carrying `id`. More than one means the corpus is invalid.
    pub fn with_id(&self, id: u32) -> Vec<&Document> {
        self.documents.iter().filter(|d| d.id() == Some(id)).collect()
    }

    /// The single document carrying `id`, if exactly one does.
    pub fn get(&self, id: u32) -> Option<&Document> {
        match self.with_id(id).as_slice() {
            [doc] => Some(*doc),
            _ => None,
        }
    }

    pub fn by_storage_name(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.storage_name == name)
    }

    pub fn ids(&self) -> BTreeSet<u32> {
        self.documents.iter().filter_map(Document::id).collect()
    }

    /// Storage names grouped by id, for ids carried by more than one document.
    pub fn duplicate_ids(&self) -> BTreeMap<u32, Vec<&str>> {
        let mut by_id: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for doc in &self.documents {
            if let Some(id) = doc.id() {
                by_id.entry(id).or_default().push(doc.storage_name.as_str());
            }
        }
        by_id.retain(|_, names| names.len() > 1);
        by_id
    }
}
