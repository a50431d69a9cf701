//! Test helpers for staging input tables and stubbing geocoders.

use super::*;
use crate::run::GeocoderBuilder;
use camino::{Utf8Path, Utf8PathBuf};
use csvpoints_core::GeocodeProvider;
use csvpoints_core::test_support::StubGeocoder;
use std::{fs, sync::Arc};
use tempfile::TempDir;

/// Temporary directory with a UTF-8 root path.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    /// Write `contents` to `name` under the workspace and return its path.
    pub(super) fn table(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, contents.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture file");
}

/// Builder handing out one shared stub regardless of provider.
pub(super) struct StubGeocoderBuilder {
    pub(super) stub: Arc<StubGeocoder>,
}

impl StubGeocoderBuilder {
    pub(super) fn resolving(latitude: f64, longitude: f64) -> Self {
        Self {
            stub: Arc::new(StubGeocoder::resolving(latitude, longitude)),
        }
    }

    pub(super) fn answering(stub: StubGeocoder) -> Self {
        Self {
            stub: Arc::new(stub),
        }
    }
}

impl GeocoderBuilder for StubGeocoderBuilder {
    fn build(&self, _provider: ProviderId) -> Result<Arc<dyn GeocodeProvider>, CliError> {
        let geocoder: Arc<dyn GeocodeProvider> = self.stub.clone();
        Ok(geocoder)
    }
}

/// Arguments naming only an input file.
pub(super) fn args_for(input: &Utf8Path) -> RunArgs {
    RunArgs {
        input: Some(input.to_path_buf()),
        ..RunArgs::default()
    }
}
