mod mock_repositories;

pub use mock_repositories::*;

use axum::Router;
use sluice_dns_api::{create_api_routes, AppState};
use sluice_dns_application::use_cases::{
    AddUpstreamFileUseCase, GetUpstreamFilesUseCase, RefreshUpstreamFilesUseCase,
    RemoveUpstreamFileUseCase, SetUpstreamFilePropertiesUseCase,
};
use std::sync::Arc;

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<InMemoryFileRepository>,
    pub refresher: Arc<MockRefresher>,
    pub persistence: Arc<MockPersistence>,
    pub reloader: Arc<MockReloader>,
}

pub fn test_app(repository: InMemoryFileRepository) -> TestApp {
    let repository = Arc::new(repository);
    let refresher = Arc::new(MockRefresher::new());
    let persistence = Arc::new(MockPersistence::default());
    let reloader = Arc::new(MockReloader::default());

    let state = AppState {
        get_files: Arc::new(GetUpstreamFilesUseCase::new(repository.clone())),
        add_file: Arc::new(AddUpstreamFileUseCase::new(
            repository.clone(),
            refresher.clone(),
            persistence.clone(),
            reloader.clone(),
        )),
        remove_file: Arc::new(RemoveUpstreamFileUseCase::new(
            repository.clone(),
            persistence.clone(),
            reloader.clone(),
        )),
        set_file_properties: Arc::new(SetUpstreamFilePropertiesUseCase::new(
            repository.clone(),
            refresher.clone(),
            persistence.clone(),
            reloader.clone(),
        )),
        refresh_files: Arc::new(RefreshUpstreamFilesUseCase::new(
            refresher.clone(),
            repository.clone(),
            persistence.clone(),
            reloader.clone(),
        )),
    };

    TestApp {
        router: create_api_routes(state),
        repository,
        refresher,
        persistence,
        reloader,
    }
}
