//! Async event loop that runs a [`ListScreen`] against a [`ResourceClient`].
//!
//! One task owns the screen. It waits on user events, the search debounce
//! deadline and every request in flight at once, and publishes a fresh
//! [`ScreenView`] after each change. Requests run concurrently but their
//! results are applied one at a time, in arrival order.

use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{Changes, ResourceClient};
use crate::error::Result;
use crate::resources::Resource;
use crate::types::RecordId;

use super::scroll::{IntersectionEntry, ObserverHandle};
use super::screen::{Command, Completion, ListScreen, ScreenView};

/// Something the user did on the screen
#[derive(Debug, Clone)]
pub enum ScreenEvent<R> {
    SearchEdited(String),
    SentinelVisible(ObserverHandle, IntersectionEntry),
    LoadMore,
    SetActive { id: RecordId, active: bool },
    Update(R),
    Create(Changes),
    Delete(RecordId),
    Retry,
    Refresh,
    DismissNotice,
    Unmount,
}

/// Send one command and wrap its result for [`ListScreen::apply`]
pub async fn execute<R, C>(client: &C, command: Command<R>) -> Completion<R>
where
    R: Resource,
    C: ResourceClient<R> + ?Sized,
{
    match command {
        Command::Fetch(ticket) => {
            let result = client.fetch_page(&ticket.request).await;
            Completion::Fetched(ticket, result)
        }
        Command::Update(pending) => {
            let result = client.update(pending.id, &pending.changes).await;
            Completion::Updated(pending, result)
        }
        Command::Create(ticket) => {
            let result = client.create(&ticket.draft).await;
            Completion::Created(ticket, result)
        }
        Command::Delete(ticket) => {
            let result = client.delete(ticket.id).await;
            Completion::Deleted(ticket, result)
        }
    }
}

/// Handle to a spawned screen
pub struct ScreenHandle<R: Resource> {
    pub events: mpsc::Sender<ScreenEvent<R>>,
    pub view: watch::Receiver<ScreenView<R>>,
    pub task: JoinHandle<ListScreen<R>>,
}

impl<R: Resource> ScreenHandle<R> {
    pub async fn send(&self, event: ScreenEvent<R>) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Unmount the screen and wait for its task to finish
    pub async fn close(self) -> Option<ListScreen<R>> {
        let _ = self.events.send(ScreenEvent::Unmount).await;
        self.task.await.ok()
    }
}

pub struct ScreenDriver<R: Resource, C> {
    screen: ListScreen<R>,
    client: Arc<C>,
}

impl<R, C> ScreenDriver<R, C>
where
    R: Resource,
    C: ResourceClient<R> + 'static,
{
    pub fn new(screen: ListScreen<R>, client: Arc<C>) -> Self {
        Self { screen, client }
    }

    /// Run the screen on its own task
    pub fn spawn(self) -> ScreenHandle<R> {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(ScreenView::default());
        let task = tokio::spawn(self.run(event_rx, view_tx));
        ScreenHandle {
            events: event_tx,
            view: view_rx,
            task,
        }
    }

    /// Mount the screen and process events until unmounted or the event
    /// channel closes. Returns the screen in its final state.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ScreenEvent<R>>,
        view: watch::Sender<ScreenView<R>>,
    ) -> ListScreen<R> {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Completion<R>>> =
            FuturesUnordered::new();

        let mount = self.screen.mount();
        in_flight.push(self.dispatch(mount));
        view.send_replace(self.screen.view());

        loop {
            let deadline = self.screen.search_deadline();

            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if matches!(event, ScreenEvent::Unmount) {
                        break;
                    }
                    if let Some(command) = self.handle(event) {
                        in_flight.push(self.dispatch(command));
                    }
                }
                Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                    self.screen.apply(completion);
                }
                _ = sleep_until(deadline), if deadline.is_some() => {
                    if let Some(command) = self.screen.poll_search(Instant::now()) {
                        in_flight.push(self.dispatch(command));
                    }
                }
            }

            view.send_replace(self.screen.view());
        }

        if !in_flight.is_empty() {
            tracing::debug!(pending = in_flight.len(), "screen unmounted with requests in flight");
        }
        self.screen.unmount();
        view.send_replace(self.screen.view());
        self.screen
    }

    fn handle(&mut self, event: ScreenEvent<R>) -> Option<Command<R>> {
        let result: Result<Option<Command<R>>> = match event {
            ScreenEvent::SearchEdited(term) => {
                self.screen.edit_search(term, Instant::now());
                Ok(None)
            }
            ScreenEvent::SentinelVisible(handle, entry) => {
                Ok(self.screen.sentinel_intersected(handle, entry))
            }
            ScreenEvent::LoadMore => Ok(self.screen.load_more()),
            ScreenEvent::SetActive { id, active } => self.screen.set_active(id, active),
            ScreenEvent::Update(record) => self.screen.mutate(record),
            ScreenEvent::Create(draft) => self.screen.create(draft).map(Some),
            ScreenEvent::Delete(id) => self.screen.delete(id).map(Some),
            ScreenEvent::Retry => Ok(Some(self.screen.retry())),
            ScreenEvent::Refresh => Ok(Some(self.screen.refresh())),
            ScreenEvent::DismissNotice => {
                self.screen.dismiss_notice();
                Ok(None)
            }
            ScreenEvent::Unmount => Ok(None),
        };

        match result {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("action rejected: {e}");
                self.screen.reject(&e);
                None
            }
        }
    }

    fn dispatch(&self, command: Command<R>) -> BoxFuture<'static, Completion<R>> {
        let client = Arc::clone(&self.client);
        Box::pin(async move { execute(client.as_ref(), command).await })
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
