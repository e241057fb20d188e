// Services Layer
// ドメインロジックを実行するサービス層

pub mod migration_loader;
pub mod reconciler;
pub mod row_projector;
pub mod state_store;
pub mod type_mapping;
