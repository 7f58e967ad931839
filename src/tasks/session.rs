use crate::backend::{ItemsBackend, ItemsPage};
use crate::config::AddHandler;
use crate::error::Error;
use crate::events::{AssetReady, SessionInput, ViewerEvent};
use crate::item::RawItem;
use crate::render::Presenter;
use crate::upload;
use crate::viewer::GalleryViewer;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const FETCH_FAILED: &str = "Failed to load gallery items.";
pub const DELETE_FAILED: &str = "Unable to delete. Please try again.";
pub const ADD_FAILED: &str = "Unable to add picture.";

enum Completed {
    Fetched(Result<ItemsPage, Error>),
    Deleted { id: String, result: Result<(), Error> },
    LocalFile { path: PathBuf, result: Result<RawItem> },
}

/// Owner of one inline viewer:
/// - Loads items from the backend on start and on `Refresh`.
/// - Applies inputs and preload completions to the viewer.
/// - Fulfils viewer requests; deletes re-fetch on success, never remove optimistically.
/// - Calls `observer` after every change so the caller can redraw.
///
/// Returns the viewer once cancelled, or once inputs are closed and no
/// request is outstanding.
#[allow(clippy::too_many_arguments)]
pub async fn run<B, P, O>(
    mut viewer: GalleryViewer<P>,
    backend: Option<Arc<B>>,
    mut inputs: Receiver<SessionInput>,
    mut viewer_events: UnboundedReceiver<ViewerEvent>,
    mut asset_ready: Receiver<AssetReady>,
    select_id: Option<String>,
    cancel: CancellationToken,
    mut observer: O,
) -> Result<GalleryViewer<P>>
where
    B: ItemsBackend,
    P: Presenter,
    O: FnMut(&GalleryViewer<P>),
{
    let mut requests: JoinSet<Completed> = JoinSet::new();
    let mut inputs_open = true;

    if let Some(backend) = &backend {
        spawn_fetch(&mut requests, backend);
    }

    loop {
        if !inputs_open && requests.is_empty() && viewer_events.is_empty() {
            break;
        }
        select! {
            _ = cancel.cancelled() => break,

            maybe = inputs.recv(), if inputs_open => match maybe {
                Some(input) => {
                    apply_input(&mut viewer, input, backend.as_ref(), &mut requests);
                    observer(&viewer);
                }
                None => {
                    debug!("session inputs closed");
                    inputs_open = false;
                }
            },

            Some(event) = viewer_events.recv() => {
                handle_viewer_event(&mut viewer, event, backend.as_ref(), &mut requests);
                observer(&viewer);
            }

            Some(AssetReady(src)) = asset_ready.recv() => {
                viewer.asset_ready(&src);
                observer(&viewer);
            }

            Some(joined) = requests.join_next() => {
                match joined {
                    Ok(completed) => {
                        complete(&mut viewer, completed, select_id.as_deref(), backend.as_ref(), &mut requests);
                        observer(&viewer);
                    }
                    Err(err) => warn!(error = %err, "backend request task aborted"),
                }
            }
        }
    }
    requests.abort_all();
    Ok(viewer)
}

fn apply_input<B: ItemsBackend, P: Presenter>(
    viewer: &mut GalleryViewer<P>,
    input: SessionInput,
    backend: Option<&Arc<B>>,
    requests: &mut JoinSet<Completed>,
) {
    match input {
        SessionInput::Input(event) => {
            viewer.handle_input(&event);
        }
        SessionInput::Search(query) => viewer.update_search(&query),
        SessionInput::Tag(tag) => viewer.set_tag(&tag),
        SessionInput::AddClicked => {
            viewer.click_add();
        }
        SessionInput::RemoveClicked(id) => {
            viewer.click_remove(&id);
        }
        SessionInput::FileChosen(path) => {
            requests.spawn(async move {
                let result = upload::load_local_item(path.clone()).await;
                Completed::LocalFile { path, result }
            });
        }
        SessionInput::StageLoaded(src) => {
            if let Some(src) = src.or_else(|| viewer.stage_src().map(str::to_string)) {
                viewer.stage_loaded(&src);
            }
        }
        SessionInput::Redraw => viewer.refresh(),
        SessionInput::Refresh => match backend {
            Some(backend) => spawn_fetch(requests, backend),
            None => debug!("refresh ignored without a backend"),
        },
    }
}

fn handle_viewer_event<B: ItemsBackend, P: Presenter>(
    viewer: &mut GalleryViewer<P>,
    event: ViewerEvent,
    backend: Option<&Arc<B>>,
    requests: &mut JoinSet<Completed>,
) {
    match event {
        ViewerEvent::AddRequested { gallery_id } => {
            if let AddHandler::Link(link) = viewer.add_handler().clone() {
                info!(%gallery_id, %link, "following add link");
                viewer.presenter_mut().follow_link(&link);
            }
        }
        ViewerEvent::FilePickerRequested => {
            info!("opening file picker");
            viewer.presenter_mut().open_file_picker();
        }
        ViewerEvent::DeleteRequested { item_id } => {
            if !viewer.role().is_privileged() {
                debug!(%item_id, "delete ignored for non-admin");
                return;
            }
            let Some(backend) = backend else {
                warn!(%item_id, "delete requested but no backend is configured");
                return;
            };
            let backend = Arc::clone(backend);
            requests.spawn(async move {
                let result = backend.delete_item(&item_id).await;
                Completed::Deleted {
                    id: item_id,
                    result,
                }
            });
        }
    }
}

fn complete<B: ItemsBackend, P: Presenter>(
    viewer: &mut GalleryViewer<P>,
    completed: Completed,
    select_id: Option<&str>,
    backend: Option<&Arc<B>>,
    requests: &mut JoinSet<Completed>,
) {
    match completed {
        Completed::Fetched(Ok(page)) => {
            viewer.set_items(&page.items, page.limit);
            if let Some(id) = select_id {
                viewer.go_to_id(id);
            }
        }
        Completed::Fetched(Err(err)) => {
            error!(error = %err, "failed to load gallery items");
            viewer.notify(FETCH_FAILED);
        }
        Completed::Deleted { id, result: Ok(()) } => {
            info!(%id, "item deleted; reloading");
            if let Some(backend) = backend {
                spawn_fetch(requests, backend);
            }
        }
        Completed::Deleted { id, result: Err(err) } => {
            warn!(%id, error = %err, "delete failed");
            viewer.notify(DELETE_FAILED);
        }
        Completed::LocalFile { path, result: Ok(item) } => {
            info!(path = %path.display(), "local picture added");
            viewer.add_items(std::slice::from_ref(&item), true);
        }
        Completed::LocalFile { path, result: Err(err) } => {
            warn!(path = %path.display(), error = %err, "local add failed");
            viewer.notify(ADD_FAILED);
        }
    }
}

fn spawn_fetch<B: ItemsBackend>(requests: &mut JoinSet<Completed>, backend: &Arc<B>) {
    let backend = Arc::clone(backend);
    requests.spawn(async move { Completed::Fetched(backend.fetch_items().await) });
}
