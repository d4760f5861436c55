use connector_core::{ResourceTrait, ResourceType};
use std::sync::LazyLock;

pub static USER: LazyLock<ResourceType> =
    LazyLock::new(|| ResourceType::new("user", "User", vec![ResourceTrait::User]));

pub static ORGANIZATION: LazyLock<ResourceType> =
    LazyLock::new(|| ResourceType::new("organization", "Organization", vec![ResourceTrait::Group]));

pub static BOARD: LazyLock<ResourceType> =
    LazyLock::new(|| ResourceType::new("board", "Board", vec![ResourceTrait::Group]));

pub fn all() -> Vec<ResourceType> {
    vec![USER.clone(), ORGANIZATION.clone(), BOARD.clone()]
}
