use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    store::Store,
    utils::{
        certificate::{CertificateIssuer, PdfCertificateIssuer},
        storage::{FileStorage, storage_from_config},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub files: Arc<dyn FileStorage>,
    pub certificates: Arc<dyn CertificateIssuer>,
}

impl AppState {
    /// Wires file storage and the PDF certificate issuer from `config`.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let files = storage_from_config(&config);
        Self::with_files(store, config, files)
    }

    pub fn with_files(store: Arc<dyn Store>, config: Config, files: Arc<dyn FileStorage>) -> Self {
        let certificates = Arc::new(PdfCertificateIssuer::new(files.clone()));
        Self {
            store,
            config,
            files,
            certificates,
        }
    }
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn FileStorage> {
    fn from_ref(state: &AppState) -> Self {
        state.files.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CertificateIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.certificates.clone()
    }
}
