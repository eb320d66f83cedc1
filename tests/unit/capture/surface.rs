use std::{
    cell::Cell,
    rc::Rc,
    sync::{Arc, Mutex},
};

use super::*;
use crate::foundation::error::AnimcapError;

struct BlankSurface;

impl RenderSurface for BlankSurface {
    fn navigate(&mut self, _url: &Url) -> AnimcapResult<()> {
        Ok(())
    }

    fn wait_ready(&mut self, _selector: &str, _timeout: Duration) -> AnimcapResult<()> {
        Ok(())
    }

    fn capture_jpeg(&mut self, _quality: u32) -> AnimcapResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Session whose connection drops after handing out `tabs` surfaces.
struct ShortLivedSession {
    id: usize,
    tabs_left: Cell<usize>,
    opened: Arc<Mutex<Vec<usize>>>,
}

impl BrowserSession for ShortLivedSession {
    fn open_tab(&self) -> AnimcapResult<Box<dyn RenderSurface>> {
        match self.tabs_left.get() {
            0 => Err(AnimcapError::Other(anyhow::anyhow!(
                "session {} connection closed",
                self.id
            ))),
            n => {
                self.tabs_left.set(n - 1);
                self.opened.lock().unwrap().push(self.id);
                Ok(Box::new(BlankSurface))
            }
        }
    }
}

fn short_lived(
    tabs: usize,
    opened: &Arc<Mutex<Vec<usize>>>,
) -> ReusableSession<ShortLivedSession> {
    let opened = Arc::clone(opened);
    let mut next_id = 0;
    ReusableSession::with_launcher(move || {
        next_id += 1;
        Ok(ShortLivedSession {
            id: next_id,
            tabs_left: Cell::new(tabs),
            opened: Arc::clone(&opened),
        })
    })
}

#[test]
fn launches_lazily() {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let provider = short_lived(2, &opened);
    assert_eq!(provider.launches(), 0);
    assert!(opened.lock().unwrap().is_empty());
}

#[test]
fn reuses_one_session_while_it_works() {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let mut provider = short_lived(5, &opened);
    for _ in 0..5 {
        provider.open_surface().unwrap();
    }
    assert_eq!(provider.launches(), 1);
    assert_eq!(*opened.lock().unwrap(), [1, 1, 1, 1, 1]);
}

#[test]
fn dead_session_is_replaced_on_next_surface() {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let mut provider = short_lived(2, &opened);
    for _ in 0..5 {
        provider.open_surface().unwrap();
    }
    assert_eq!(provider.launches(), 3);
    assert_eq!(*opened.lock().unwrap(), [1, 1, 2, 2, 3]);
}

#[test]
fn relaunches_at_most_once_per_surface() {
    let launches = Rc::new(Cell::new(0));
    let counter = Rc::clone(&launches);
    let opened = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&opened);
    let mut provider = ReusableSession::with_launcher(move || {
        counter.set(counter.get() + 1);
        Ok(ShortLivedSession {
            id: counter.get(),
            tabs_left: Cell::new(0),
            opened: Arc::clone(&log),
        })
    });

    assert!(provider.open_surface().is_err());
    assert_eq!(launches.get(), 1);
    assert!(provider.open_surface().is_err());
    assert_eq!(launches.get(), 2);
    assert!(opened.lock().unwrap().is_empty());
}

#[test]
fn launch_failure_is_returned_and_retried_next_time() {
    let mut attempts = 0;
    let opened = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&opened);
    let mut provider = ReusableSession::with_launcher(move || {
        attempts += 1;
        if attempts == 1 {
            return Err(AnimcapError::Other(anyhow::anyhow!("chrome not found")));
        }
        Ok(ShortLivedSession {
            id: attempts,
            tabs_left: Cell::new(10),
            opened: Arc::clone(&log),
        })
    });

    let err = provider.open_surface().err().unwrap();
    assert!(err.to_string().contains("chrome not found"));
    assert_eq!(provider.launches(), 0);
    provider.open_surface().unwrap();
    assert_eq!(provider.launches(), 1);
    assert_eq!(*opened.lock().unwrap(), [2]);
}
