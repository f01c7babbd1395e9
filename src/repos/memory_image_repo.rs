/*
 * Responsibility
 * - DATABASE_URL 無しで動かすための in-memory repository (dev / test)
 * - staged な変更は commit 時に 1 回の write lock でまとめて反映する
 * - commit 時、Replace / Remove の対象がまだ存在するかを先に全件確認する
 *   (他の unit of work が先に消していたら NotFound。何も反映しない)
 */
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::{
    error::{RepoError, RepoResult},
    image_repo::{ImageRecord, ImageRepository, ImageUnitOfWork},
};

type Images = Arc<RwLock<HashMap<Uuid, ImageRecord>>>;

#[derive(Clone, Debug, Default)]
pub struct InMemoryImageRepository {
    images: Images,
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn begin(&self) -> RepoResult<Box<dyn ImageUnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            images: self.images.clone(),
            staged: Vec::new(),
            closed: false,
        }))
    }
}

#[derive(Debug)]
enum Staged {
    Insert(ImageRecord),
    Replace(ImageRecord),
    Remove(Uuid),
}

impl Staged {
    fn id(&self) -> Uuid {
        match self {
            Staged::Insert(image) | Staged::Replace(image) => image.id,
            Staged::Remove(id) => *id,
        }
    }
}

struct InMemoryUnitOfWork {
    images: Images,
    staged: Vec<Staged>,
    closed: bool,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> RepoResult<()> {
        if self.closed {
            return Err(RepoError::Closed);
        }
        Ok(())
    }

    // Latest staged change for `id`: Some(Some(_)) put, Some(None) removed, None untouched.
    fn staged_state(&self, id: Uuid) -> Option<Option<&ImageRecord>> {
        self.staged
            .iter()
            .rev()
            .filter(|op| op.id() == id)
            .map(|op| match op {
                Staged::Insert(image) | Staged::Replace(image) => Some(image),
                Staged::Remove(_) => None,
            })
            .next()
    }
}

#[async_trait]
impl ImageUnitOfWork for InMemoryUnitOfWork {
    async fn add(&mut self, image: ImageRecord) -> RepoResult<()> {
        self.ensure_open()?;
        self.staged.push(Staged::Insert(image));
        Ok(())
    }

    async fn get(&mut self, id: Uuid) -> RepoResult<Option<ImageRecord>> {
        self.ensure_open()?;
        if let Some(staged) = self.staged_state(id) {
            return Ok(staged.cloned());
        }
        Ok(self.images.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&mut self, owner_id: &str) -> RepoResult<Vec<ImageRecord>> {
        self.ensure_open()?;
        let mut view: HashMap<Uuid, ImageRecord> = self
            .images
            .read()
            .await
            .values()
            .filter(|image| image.owner_id == owner_id)
            .map(|image| (image.id, image.clone()))
            .collect();

        for op in &self.staged {
            match op {
                Staged::Insert(image) | Staged::Replace(image) if image.owner_id == owner_id => {
                    view.insert(image.id, image.clone());
                }
                Staged::Insert(_) | Staged::Replace(_) => {}
                Staged::Remove(id) => {
                    view.remove(id);
                }
            }
        }

        let mut images: Vec<ImageRecord> = view.into_values().collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }

    async fn update(&mut self, image: &ImageRecord) -> RepoResult<()> {
        if self.get(image.id).await?.is_none() {
            return Err(RepoError::NotFound);
        }
        self.staged.push(Staged::Replace(image.clone()));
        Ok(())
    }

    async fn delete(&mut self, image: &ImageRecord) -> RepoResult<()> {
        if self.get(image.id).await?.is_none() {
            return Err(RepoError::NotFound);
        }
        self.staged.push(Staged::Remove(image.id));
        Ok(())
    }

    async fn commit(&mut self) -> RepoResult<()> {
        self.ensure_open()?;
        self.closed = true;

        let mut images = self.images.write().await;
        verify_targets(&images, &self.staged)?;

        for op in self.staged.drain(..) {
            match op {
                Staged::Insert(image) | Staged::Replace(image) => {
                    images.insert(image.id, image);
                }
                Staged::Remove(id) => {
                    images.remove(&id);
                }
            }
        }
        Ok(())
    }
}

// Replays the staged ops against the committed ids. A Replace / Remove whose target
// is gone (e.g. deleted by a unit of work that committed first) fails the whole commit.
fn verify_targets(images: &HashMap<Uuid, ImageRecord>, staged: &[Staged]) -> RepoResult<()> {
    let mut inserted = HashSet::new();
    let mut removed = HashSet::new();

    for op in staged {
        let id = op.id();
        let exists =
            !removed.contains(&id) && (inserted.contains(&id) || images.contains_key(&id));
        match op {
            Staged::Insert(_) => {
                removed.remove(&id);
                inserted.insert(id);
            }
            Staged::Replace(_) | Staged::Remove(_) if !exists => {
                return Err(RepoError::NotFound);
            }
            Staged::Replace(_) => {}
            Staged::Remove(_) => {
                inserted.remove(&id);
                removed.insert(id);
            }
        }
    }
    Ok(())
}
