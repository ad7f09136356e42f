use std::path::PathBuf;

use async_trait::async_trait;

use dotnotes_shared::Dot;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn load(&self) -> Vec<Dot>;
    async fn save(&self, dots: &[Dot]);
}

/// Dots as a single JSON file on disk. Load and save failures are logged
/// and swallowed; the board keeps serving from memory either way.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("dots.json"),
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load(&self) -> Vec<Dot> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    eprintln!("Failed to read {}: {error}", self.path.display());
                }
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Dot>>(&contents) {
            Ok(mut dots) => {
                dots.sort_by_key(|dot| dot.created_at);
                dots
            }
            Err(error) => {
                eprintln!("Failed to parse {}: {error}", self.path.display());
                Vec::new()
            }
        }
    }

    async fn save(&self, dots: &[Dot]) {
        let payload = match serde_json::to_vec_pretty(dots) {
            Ok(payload) => payload,
            Err(error) => {
                eprintln!("Failed to serialize dots: {error}");
                return;
            }
        };
        // Write-then-rename so a crash mid-write never truncates the file.
        let tmp = self.path.with_extension("json.tmp");
        if let Err(error) = tokio::fs::write(&tmp, &payload).await {
            eprintln!("Failed to write {}: {error}", tmp.display());
            return;
        }
        if let Err(error) = tokio::fs::rename(&tmp, &self.path).await {
            eprintln!("Failed to replace {}: {error}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(id: &str, created_at: u64) -> Dot {
        Dot {
            id: id.into(),
            x: 10.0,
            y: 20.0,
            text: "note".into(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips_in_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        storage.save(&[dot("b", 2), dot("a", 1)]).await;
        let loaded = storage.load().await;
        let ids = loaded.iter().map(|dot| dot.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("dots.json"), b"not json")
            .await
            .unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.load().await.is_empty());
    }
}
