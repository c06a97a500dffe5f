// Model artifact persistence: gzip JSON snapshots plus a LATEST pointer
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use peerlink_core::{
    ModelSink, NeighborIndex, Normalizer, ScaledFeatureVector, SimilarityModel, FEATURE_DIM,
    FEATURE_NAMES,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const ARTIFACT_EXTENSION: &str = "artifact";
pub const CHECKSUM_EXTENSION: &str = "sha256";
pub const LATEST_POINTER: &str = "LATEST";
pub const FORMAT_VERSION: u32 = 1;

/// On-disk form of a fitted [`SimilarityModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_id: Uuid,
    pub fitted_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub mean: [f32; FEATURE_DIM],
    pub std: [f32; FEATURE_DIM],
    pub k: usize,
    pub ids: Vec<String>,
    pub vectors: Vec<[f32; FEATURE_DIM]>,
}

impl ModelArtifact {
    pub fn from_model(model: &SimilarityModel) -> Self {
        let index = model.index();
        Self {
            format_version: FORMAT_VERSION,
            model_id: model.id(),
            fitted_at: model.fitted_at(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            mean: *model.normalizer().mean(),
            std: *model.normalizer().std(),
            k: index.k(),
            ids: index.ids().to_vec(),
            vectors: index.vectors().iter().map(|v| v.values()).collect(),
        }
    }

    /// Rebuild the snapshot, re-checking scaler and index invariants.
    pub fn into_model(self) -> Result<SimilarityModel> {
        if self.format_version != FORMAT_VERSION {
            bail!("unsupported artifact format version {}", self.format_version);
        }
        if self.feature_names.len() != FEATURE_DIM
            || self.feature_names.iter().zip(FEATURE_NAMES.iter()).any(|(a, b)| a != b)
        {
            bail!("artifact feature layout {:?} does not match {:?}", self.feature_names, FEATURE_NAMES);
        }

        let normalizer = Normalizer::from_parts(self.mean, self.std)?;
        let vectors = self.vectors.into_iter().map(ScaledFeatureVector::new).collect();
        let index = NeighborIndex::from_parts(self.ids, vectors, self.k)?;
        Ok(SimilarityModel::from_parts(self.model_id, normalizer, index, self.fitted_at))
    }
}

/// Artifact description for listings and API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescription {
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Contents of the `LATEST` pointer file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub name: String,
    pub checksum: String,
    pub fit_timestamp: DateTime<Utc>,
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating artifact directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_name(model: &SimilarityModel) -> String {
        let id = model.id().simple().to_string();
        format!(
            "model-{}-{}.{}",
            model.fitted_at().format("%Y%m%dT%H%M%S%.3fZ"),
            &id[..8],
            ARTIFACT_EXTENSION
        )
    }

    fn checksum_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, CHECKSUM_EXTENSION))
    }

    /// Write the artifact and its checksum, then move `LATEST` to it.
    pub fn save(&self, model: &SimilarityModel) -> Result<ArtifactDescription> {
        let name = Self::artifact_name(model);
        let json = serde_json::to_vec(&ModelArtifact::from_model(model))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let bytes = encoder.finish()?;
        let checksum = format!("{:x}", Sha256::digest(&bytes));

        write_atomic(&self.dir.join(&name), &bytes)?;
        write_atomic(&self.checksum_path(&name), checksum.as_bytes())?;

        let pointer = LatestPointer {
            name: name.clone(),
            checksum: checksum.clone(),
            fit_timestamp: model.fitted_at(),
        };
        write_atomic(&self.dir.join(LATEST_POINTER), &serde_json::to_vec_pretty(&pointer)?)?;

        info!(artifact = %name, model = %model.id(), size = bytes.len(), "model artifact saved");
        Ok(ArtifactDescription {
            name,
            size: bytes.len() as u64,
            checksum: Some(checksum),
        })
    }

    /// Load a named artifact, verifying it against its checksum file.
    pub fn load(&self, name: &str) -> Result<SimilarityModel> {
        let checksum_path = self.checksum_path(name);
        let expected = fs::read_to_string(&checksum_path)
            .with_context(|| format!("reading checksum for artifact '{}'", name))?;
        self.load_verified(name, expected.trim())
    }

    /// Load whatever `LATEST` points to. `Ok(None)` when nothing was saved yet.
    pub fn load_latest(&self) -> Result<Option<SimilarityModel>> {
        let Some(pointer) = self.latest_pointer()? else {
            return Ok(None);
        };
        self.load_verified(&pointer.name, &pointer.checksum).map(Some)
    }

    pub fn latest_pointer(&self) -> Result<Option<LatestPointer>> {
        let path = self.dir.join(LATEST_POINTER);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        let pointer = serde_json::from_slice(&raw).context("parsing LATEST pointer")?;
        Ok(Some(pointer))
    }

    fn load_verified(&self, name: &str, expected_checksum: &str) -> Result<SimilarityModel> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(anyhow!("artifact '{}' not found in {}", name, self.dir.display()));
        }

        let bytes = fs::read(&path)?;
        let actual = format!("{:x}", Sha256::digest(&bytes));
        if actual != expected_checksum {
            bail!(
                "checksum mismatch for artifact '{}': expected {}, got {}",
                name,
                expected_checksum,
                actual
            );
        }

        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;

        let artifact: ModelArtifact = serde_json::from_slice(&json)
            .with_context(|| format!("decoding artifact '{}'", name))?;
        let model = artifact.into_model()?;
        debug!(artifact = %name, model = %model.id(), corpus = model.corpus_size(), "model artifact loaded");
        Ok(model)
    }

    /// All artifacts, newest first.
    pub fn list(&self) -> Result<Vec<ArtifactDescription>> {
        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let checksum = fs::read_to_string(self.checksum_path(name))
                    .ok()
                    .map(|s| s.trim().to_string());
                artifacts.push(ArtifactDescription {
                    name: name.to_string(),
                    size: fs::metadata(&path)?.len(),
                    checksum,
                });
            }
        }

        // names embed the fit timestamp
        artifacts.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(artifacts)
    }
}

impl ModelSink for ArtifactStore {
    fn persist(&self, model: &SimilarityModel) -> peerlink_core::Result<()> {
        self.save(model)
            .map(|_| ())
            .map_err(|e| peerlink_core::Error::Storage(format!("{:#}", e)))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .with_context(|| format!("writing {}", path.display()))
}
