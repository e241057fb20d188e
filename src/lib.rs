// sqlreconcileライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインモデル（マイグレーション列、統一値、カラム情報、エラー、設定）
// - adapters: 接続URL・接続プール・文実行・行カーソルへのアクセスを抽象化
// - services: マイグレーション読み込み、調整、行射影、適用状態ストア

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
