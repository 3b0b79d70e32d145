//! Node and file definitions - the static records of the narrative graph.

use serde::Deserialize;

/// Kinds of files a node can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Plain prose, readable with `cat`.
    Text,
    /// A runnable script; carries a `script_id`.
    Script,
    /// A collectible item; carries an `item_id`.
    Item,
}

impl FileKind {
    /// Lowercase label used in file listings.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Script => "script",
            FileKind::Item => "item",
        }
    }
}

/// A file hosted on a node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeFile {
    pub name: String,
    pub kind: FileKind,
    pub content: String,

    /// Marks the content as an encoded payload; reading it caches the
    /// ciphertext for a later `decode`.
    #[serde(default)]
    pub cipher: bool,

    /// Whether `download` may take this file.
    #[serde(default)]
    pub downloadable: bool,

    /// Script identifier for [`FileKind::Script`] files.
    #[serde(default)]
    pub script_id: Option<String>,

    /// Item identifier for [`FileKind::Item`] files.
    #[serde(default)]
    pub item_id: Option<String>,
}

/// Entry requirements guarding a node.
///
/// Both lists keep their declared order; missing-requirement reports preserve
/// it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryGate {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl EntryGate {
    /// An ungated entry requires nothing at all.
    pub fn is_open(&self) -> bool {
        self.items.is_empty() && self.flags.is_empty()
    }
}

/// A location in the narrative graph.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub desc: String,

    #[serde(default)]
    pub entry: EntryGate,

    /// Narrative neighbors. Not consulted for gating or discovery; validated
    /// against the graph so the data cannot dangle.
    #[serde(default)]
    pub links: Vec<String>,

    /// Files in declared order.
    #[serde(default)]
    pub files: Vec<NodeFile>,
}

impl Node {
    /// Look up a hosted file by name.
    pub fn file(&self, name: &str) -> Option<&NodeFile> {
        self.files.iter().find(|file| file.name == name)
    }

    /// Find a script file hosted here by script identifier.
    pub fn script_file(&self, script_id: &str) -> Option<&NodeFile> {
        self.files.iter().find(|file| {
            file.kind == FileKind::Script && file.script_id.as_deref() == Some(script_id)
        })
    }
}
