use std::path::PathBuf;

use crate::input::InputEvent;

/// Requests a viewer raises for its owner to fulfil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The add control was pressed and adding is delegated to the owner.
    AddRequested { gallery_id: String },
    /// The add control was pressed and the default file picker should open.
    FilePickerRequested,
    /// A privileged user pressed the remove affordance on a thumbnail.
    DeleteRequested { item_id: String },
}

/// Viewer -> Preloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRequest(pub String);

/// Preloader -> Session, once an asset is decoded or fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReady(pub String);

/// External -> Session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Input(InputEvent),
    Search(String),
    Tag(String),
    AddClicked,
    RemoveClicked(String),
    /// A file chosen in the default picker.
    FileChosen(PathBuf),
    /// The stage asset finished loading in the presentation layer; `None`
    /// means whatever is on stage right now.
    StageLoaded(Option<String>),
    /// Re-run the render pipeline without touching state.
    Redraw,
    /// Reload items from the backend.
    Refresh,
}
