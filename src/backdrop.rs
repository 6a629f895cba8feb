use include_dir::{include_dir, Dir};
use unicode_width::UnicodeWidthStr;

static BACKDROP_DIR: Dir = include_dir!("src/backdrops");

pub const DEFAULT_BACKDROP: &str = "grid";

/// An embedded ASCII-art scene drawn dimly behind the click canvas.
///
/// The backdrop plays the role the background image plays in a pixel UI: it
/// gives the user stable visual anchors to aim their click sequence at.
#[derive(Clone, Debug)]
pub struct Backdrop {
    pub name: String,
    pub lines: Vec<String>,
}

impl Backdrop {
    /// Load an embedded backdrop by name, if one exists.
    pub fn named(name: &str) -> Option<Self> {
        let file = BACKDROP_DIR.get_file(format!("{name}.txt"))?;
        let art = file.contents_utf8()?;

        Some(Self {
            name: name.to_string(),
            lines: art.lines().map(str::to_string).collect(),
        })
    }

    /// Load an embedded backdrop by name, falling back to the default scene
    /// for names that do not exist (e.g. a hand-edited config file).
    pub fn named_or_default(name: &str) -> Self {
        Self::named(name)
            .or_else(|| Self::named(DEFAULT_BACKDROP))
            .expect("default backdrop is embedded")
    }

    /// Widest line of the art, in terminal cells.
    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()))
            .max()
            .unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Names of all embedded backdrops, for help text.
    pub fn available() -> Vec<String> {
        let mut names: Vec<String> = BACKDROP_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
