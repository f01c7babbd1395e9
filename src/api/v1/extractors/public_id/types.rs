/**
 * Responsibility
 *
 * 主な責務
 *  - リソースごとの「意味付きID型」を宣言する
 *
 * 置くもの
 *  - ImageTag などのタグ型
 *  - type ImageId = PublicId<ImageTag> のような alias
 *
 * 置かないもの
 *  - parse ロジック
 *  - extractor 実装
 */
use super::core::PublicId;

/**
 * 以下に pub で列挙するものは、./mod.rs 経由で全て公開されるため注意
 * pub use types::*;
 */
// images
pub enum ImageTag {}
pub type ImageId = PublicId<ImageTag>;
