#[cfg(any(feature = "flate2", feature = "bzip2"))]
use crate::Error;
use crate::{Config, FileFormat, Result};
#[cfg(feature = "tar")]
use crate::untar::{self, Extraction};
use std::path::{Path, PathBuf};

/// One transition of the unwrap loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A gzip or bzip2 layer was removed; `destination` is sniffed next.
    Decompressed {
        format: FileFormat,
        source: PathBuf,
        destination: PathBuf,
    },
    /// A tar archive was extracted. Always the last step.
    #[cfg(feature = "tar")]
    Extracted {
        source: PathBuf,
        extraction: Extraction,
    },
    /// Nothing recognised at `path`. Always the last step.
    Finished { path: PathBuf },
}

impl Step {
    /// Where the data is after this step.
    pub fn path(&self) -> &Path {
        match self {
            Step::Decompressed { destination, .. } => destination,
            #[cfg(feature = "tar")]
            Step::Extracted { extraction, .. } => &extraction.destination,
            Step::Finished { path } => path,
        }
    }
}

/// Iterator over the steps needed to peel a file, performing each step as it
/// is requested.
///
/// Yields `Ok` steps until a terminal one ([`Step::Finished`] or
/// [`Step::Extracted`]), or a single `Err` wrapped in
/// [`Error::Failed`](crate::Error::Failed) with the path being processed.
/// Nothing is yielded after either.
#[derive(Debug)]
pub struct Steps {
    config: Config,
    next: Option<PathBuf>,
    depth: usize,
}

impl Steps {
    fn new(config: Config, path: PathBuf) -> Self {
        Self {
            config,
            next: Some(path),
            depth: 0,
        }
    }

    /// Number of decompression steps performed so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn transition(&mut self, path: &Path) -> Result<Step> {
        let format = FileFormat::from_file(path)?;
        log::info!("{}: {}", path.display(), format);

        match format {
            FileFormat::Unknown => Ok(Step::Finished {
                path: path.to_path_buf(),
            }),
            #[cfg(feature = "flate2")]
            FileFormat::Gzip => {
                self.check_depth()?;
                let destination = crate::decompress::gunzip(path)?;
                Ok(self.decompressed(format, path, destination))
            }
            #[cfg(feature = "bzip2")]
            FileFormat::Bzip2 => {
                self.check_depth()?;
                let destination = crate::decompress::bunzip2(path)?;
                Ok(self.decompressed(format, path, destination))
            }
            #[cfg(feature = "tar")]
            FileFormat::Tar => {
                let extraction = untar::extract(path)?;
                Ok(Step::Extracted {
                    source: path.to_path_buf(),
                    extraction,
                })
            }
        }
    }

    #[cfg(any(feature = "flate2", feature = "bzip2"))]
    fn check_depth(&self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthExceeded(self.depth));
        }
        Ok(())
    }

    #[cfg(any(feature = "flate2", feature = "bzip2"))]
    fn decompressed(&mut self, format: FileFormat, source: &Path, destination: PathBuf) -> Step {
        self.depth += 1;
        self.next = Some(destination.clone());
        Step::Decompressed {
            format,
            source: source.to_path_buf(),
            destination,
        }
    }
}

impl Iterator for Steps {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.next.take()?;
        Some(self.transition(&path).map_err(|e| {
            log::debug!("stopped at {}: {}", path.display(), e);
            e.at(path)
        }))
    }
}

/// Outcome of peeling a file completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    path: PathBuf,
    steps: Vec<Step>,
}

impl Resolution {
    /// Final resting place: the plain file, or the extraction directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of gzip/bzip2 layers removed.
    pub fn layers(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Decompressed { .. }))
            .count()
    }

    #[cfg(feature = "tar")]
    pub fn extraction(&self) -> Option<&Extraction> {
        self.steps.iter().find_map(|step| match step {
            Step::Extracted { extraction, .. } => Some(extraction),
            _ => None,
        })
    }
}

/// Drives [`Steps`] with a given [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: Config,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn steps<P: AsRef<Path>>(&self, path: P) -> Steps {
        Steps::new(self.config, path.as_ref().to_path_buf())
    }

    /// Peel `path` until nothing recognisable is left. The first error stops
    /// the process; outputs of earlier steps are kept.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<Resolution> {
        let path = path.as_ref();
        let steps = self.steps(path).collect::<Result<Vec<_>>>()?;
        let resting = steps
            .last()
            .map(|step| step.path().to_path_buf())
            .unwrap_or_else(|| path.to_path_buf());
        Ok(Resolution {
            path: resting,
            steps,
        })
    }
}

/// Peel `path` with the default [`Config`].
pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Resolution> {
    Resolver::default().resolve(path)
}
