use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Counter, Store};
use crate::error::StoreError;
use crate::models::{Event, Registration};

pub const EVENTS_FILE: &str = "events.json";
pub const REGISTRATIONS_FILE: &str = "registrations.json";
pub const COUNTERS_FILE: &str = "counters.json";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub event_id: i64,
    pub registration_id: i64,
}

/// JSON-array-per-entity store. Every mutation rewrites the whole file.
pub struct FileStore {
    dir: PathBuf,
    // Сериализует read-modify-write файлов внутри процесса
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store, creating the directory and any missing file.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = FileStore {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };
        fs::create_dir_all(&store.dir).await?;
        store.ensure::<Vec<Event>>(EVENTS_FILE).await?;
        store.ensure::<Vec<Registration>>(REGISTRATIONS_FILE).await?;
        store.ensure::<Counters>(COUNTERS_FILE).await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn ensure<T: Default + Serialize>(&self, name: &str) -> Result<(), StoreError> {
        match fs::metadata(self.path(name)).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating {}", self.path(name).display());
                self.write(name, &T::default()).await
            }
            Err(e) => Err(e.into()),
        }
    }

    // Отсутствующий или пустой файл читается как значение по умолчанию
    async fn read<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        match fs::read(self.path(name)).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    // Пишем во временный файл и переименовываем, чтобы читатель не увидел половину
    async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(value)?;
        let tmp = self.path(&format!("{name}.tmp"));
        fs::create_dir_all(&self.dir).await?;
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, self.path(name)).await?;
        debug!("Rewrote {}", name);
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        fs::metadata(&self.dir).await?;
        Ok(())
    }

    async fn next_id(&self, counter: Counter) -> Result<i64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut counters: Counters = self.read(COUNTERS_FILE).await?;
        let slot = match counter {
            Counter::Event => &mut counters.event_id,
            Counter::Registration => &mut counters.registration_id,
        };
        *slot += 1;
        let id = *slot;
        self.write(COUNTERS_FILE, &counters).await?;
        Ok(id)
    }

    async fn events(&self) -> Result<Vec<Event>, StoreError> {
        self.read(EVENTS_FILE).await
    }

    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        let events: Vec<Event> = self.read(EVENTS_FILE).await?;
        Ok(events.into_iter().find(|e| e.id == id))
    }

    async fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut events: Vec<Event> = self.read(EVENTS_FILE).await?;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event.clone(),
            None => events.push(event.clone()),
        }
        self.write(EVENTS_FILE, &events).await
    }

    async fn remove_event(&self, id: i64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut events: Vec<Event> = self.read(EVENTS_FILE).await?;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Ok(false);
        }
        self.write(EVENTS_FILE, &events).await?;
        Ok(true)
    }

    async fn registrations(&self) -> Result<Vec<Registration>, StoreError> {
        self.read(REGISTRATIONS_FILE).await
    }

    async fn registration(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let registrations: Vec<Registration> = self.read(REGISTRATIONS_FILE).await?;
        Ok(registrations.into_iter().find(|r| r.id == id))
    }

    async fn save_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut registrations: Vec<Registration> = self.read(REGISTRATIONS_FILE).await?;
        match registrations.iter_mut().find(|r| r.id == registration.id) {
            Some(slot) => *slot = registration.clone(),
            None => registrations.push(registration.clone()),
        }
        self.write(REGISTRATIONS_FILE, &registrations).await
    }

    async fn remove_registrations(&self, ids: &[i64]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let mut registrations: Vec<Registration> = self.read(REGISTRATIONS_FILE).await?;
        let before = registrations.len();
        registrations.retain(|r| !ids.contains(&r.id));
        let removed = before - registrations.len();
        if removed > 0 {
            self.write(REGISTRATIONS_FILE, &registrations).await?;
        }
        Ok(removed)
    }
}
