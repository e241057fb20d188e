// Core Domain
// マイグレーションモデル、統一値モデル、設定、エラー型などの純粋なドメイン定義

pub mod column;
pub mod config;
pub mod driver;
pub mod error;
pub mod migration;
pub mod naming;
pub mod uniform;
