//! Assets are named accounts, such as a bank account or a cash wallet, that
//! transactions can be attributed to.

mod core;
mod endpoints;

pub use core::{
    Asset, AssetForm, AssetKind, asset_belongs_to, create_asset,
    create_asset_table, list_assets, map_asset_row_with_offset,
};
pub use endpoints::{
    create_asset_endpoint, delete_asset_endpoint, edit_asset_endpoint, list_assets_endpoint,
};

#[cfg(test)]
pub use core::delete_asset;
