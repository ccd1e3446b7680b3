use serde::{Deserialize, Serialize};

/// Image formats accepted by [`MediaStore::add_picture`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Emf,
    Wmf,
    Tiff,
}

impl PictureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpeg",
            PictureFormat::Gif => "gif",
            PictureFormat::Bmp => "bmp",
            PictureFormat::Emf => "emf",
            PictureFormat::Wmf => "wmf",
            PictureFormat::Tiff => "tiff",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Gif => "image/gif",
            PictureFormat::Bmp => "image/bmp",
            PictureFormat::Emf => "image/x-emf",
            PictureFormat::Wmf => "image/x-wmf",
            PictureFormat::Tiff => "image/tiff",
        }
    }

    /// Format for a part-name extension (`jpg` and `jpeg` both map to Jpeg).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "png" => PictureFormat::Png,
            "jpg" | "jpeg" => PictureFormat::Jpeg,
            "gif" => PictureFormat::Gif,
            "bmp" => PictureFormat::Bmp,
            "emf" => PictureFormat::Emf,
            "wmf" => PictureFormat::Wmf,
            "tif" | "tiff" => PictureFormat::Tiff,
            _ => return None,
        })
    }
}

/// One registered picture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureData {
    pub format: PictureFormat,
    pub bytes: Vec<u8>,
}

/// Workbook-wide picture list.
///
/// Indices are append-only: removing a picture leaves a tombstone, so an index
/// handed out once never refers to different data later.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStore {
    entries: Vec<Option<PictureData>>,
}

impl MediaStore {
    pub fn add_picture(&mut self, bytes: Vec<u8>, format: PictureFormat) -> usize {
        self.entries.push(Some(PictureData { format, bytes }));
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&PictureData> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    /// Logically remove a picture; its index is never reused.
    pub fn remove(&mut self, index: usize) -> Option<PictureData> {
        self.entries.get_mut(index).and_then(Option::take)
    }

    /// Live pictures with their stable indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PictureData)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|p| (i, p)))
    }

    /// Slots handed out so far, removed ones included.
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_never_reused() {
        let mut store = MediaStore::default();
        let a = store.add_picture(vec![1], PictureFormat::Png);
        let b = store.add_picture(vec![2], PictureFormat::Jpeg);
        assert!(store.remove(a).is_some());
        let c = store.add_picture(vec![3], PictureFormat::Png);
        assert_eq!((a, b, c), (0, 1, 2));
        assert!(store.get(a).is_none());
        assert_eq!(store.iter().map(|(i, _)| i).collect::<Vec<_>>(), vec![1, 2]);
    }
}
