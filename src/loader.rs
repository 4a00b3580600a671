use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::cancel::Cancellable;
use crate::options::LoadOptions;
use crate::profile::Profile;
use crate::{ProfileError, Result};

const LOG_PREFIX: &str = "[profile-loader]";
const WORKER_THREAD_NAME: &str = "profile-loader";

/// Read `stream` to the end and return everything it yielded.
///
/// The stream is only borrowed: it is neither closed nor rewound, and on
/// error the bytes read so far are dropped. Cancellation is checked before
/// every read, so a long or stalling stream is abandoned at the next read
/// boundary after `cancellable` is signalled.
pub(crate) fn read_document<R: Read + ?Sized>(
    stream: &mut R,
    cancellable: Option<&Cancellable>,
    options: &LoadOptions,
) -> Result<Vec<u8>> {
    let mut reader =
        BufReader::with_capacity(options.effective_chunk_size(), stream);
    let mut data = Vec::new();

    loop {
        check(cancellable)?;

        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(options.poll_interval());
                continue;
            }
            Err(err) => {
                log::warn!("{} failed to read stream: {}", LOG_PREFIX, err);
                return Err(err.into());
            }
        };
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        if let Some(limit) = options.max_document_size {
            if data.len() + len > limit {
                log::warn!(
                    "{} stream exceeds the limit of {} bytes",
                    LOG_PREFIX,
                    limit
                );
                return Err(ProfileError::TooLarge { limit });
            }
        }
        data.extend_from_slice(chunk);
        reader.consume(len);

        log::trace!("{} {} bytes read, {} total", LOG_PREFIX, len, data.len());
    }

    check(cancellable)?;
    Ok(data)
}

fn check(cancellable: Option<&Cancellable>) -> Result<()> {
    match cancellable {
        Some(cancellable) => cancellable.check().map_err(|err| {
            log::debug!("{} load cancelled", LOG_PREFIX);
            err
        }),
        None => Ok(()),
    }
}

impl Profile {
    /// Load a profile from `stream`, blocking the current thread.
    ///
    /// The stream is read to EOF but stays open; closing it is up to the
    /// caller. See [`Profile::load_sync_with_options`].
    pub fn load_sync<R: Read + ?Sized>(
        stream: &mut R,
        cancellable: Option<&Cancellable>,
    ) -> Result<Self> {
        Self::load_sync_with_options(
            stream,
            cancellable,
            &LoadOptions::default(),
        )
    }

    /// Load a profile from `stream`, blocking the current thread.
    ///
    /// Fails with
    /// - [`ProfileError::Io`] if reading the stream fails,
    /// - [`ProfileError::Cancelled`] if `cancellable` is signalled first,
    /// - [`ProfileError::TooLarge`] if the stream outgrows the size limit,
    /// - [`ProfileError::Parse`] if the bytes are not well-formed JSON,
    /// - [`ProfileError::Schema`] if there is no usable top-level `uid`.
    pub fn load_sync_with_options<R: Read + ?Sized>(
        stream: &mut R,
        cancellable: Option<&Cancellable>,
        options: &LoadOptions,
    ) -> Result<Self> {
        let data = read_document(stream, cancellable, options)?;
        Self::from_slice(&data).map_err(|err| {
            log::warn!("{} rejected profile: {}", LOG_PREFIX, err);
            err
        })
    }

    /// Load a profile without blocking the async runtime.
    ///
    /// Runs [`Profile::load_sync`] on tokio's blocking pool. The stream is
    /// moved there for the duration of the load and handed back together
    /// with the result, still open.
    pub async fn load<R: Read + Send + 'static>(
        stream: R,
        cancellable: Option<Cancellable>,
    ) -> (R, Result<Self>) {
        Self::load_with_options(stream, cancellable, LoadOptions::default())
            .await
    }

    pub async fn load_with_options<R: Read + Send + 'static>(
        stream: R,
        cancellable: Option<Cancellable>,
        options: LoadOptions,
    ) -> (R, Result<Self>) {
        let task = tokio::task::spawn_blocking(move || {
            load_owned(stream, cancellable, &options)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => match err.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                // blocking tasks are only dropped unstarted on runtime
                // shutdown, which also drops this future
                Err(err) => panic!("profile load task vanished: {}", err),
            },
        }
    }

    /// Load a profile on a dedicated thread and report through a callback.
    ///
    /// For callers without an async runtime. `on_complete` runs exactly once,
    /// on the worker thread, with the stream and the same result
    /// [`Profile::load_sync`] would have produced. The load starts right
    /// away, but `on_complete` is held back until the returned
    /// [`PendingLoad`] is dropped or joined, so it never runs before this
    /// call has returned. Only fails if the worker cannot be spawned, in
    /// which case `on_complete` is never called.
    pub fn load_with_callback<R, F>(
        stream: R,
        cancellable: Option<Cancellable>,
        on_complete: F,
    ) -> Result<PendingLoad>
    where
        R: Read + Send + 'static,
        F: FnOnce(R, Result<Profile>) + Send + 'static,
    {
        Self::load_with_callback_and_options(
            stream,
            cancellable,
            LoadOptions::default(),
            on_complete,
        )
    }

    pub fn load_with_callback_and_options<R, F>(
        stream: R,
        cancellable: Option<Cancellable>,
        options: LoadOptions,
        on_complete: F,
    ) -> Result<PendingLoad>
    where
        R: Read + Send + 'static,
        F: FnOnce(R, Result<Profile>) + Send + 'static,
    {
        let (release, released) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                let (stream, result) =
                    load_owned(stream, cancellable, &options);
                // returns once the PendingLoad is gone
                let _ = released.recv();
                on_complete(stream, result);
            })?;
        Ok(PendingLoad { release, worker })
    }
}

/// A load started by [`Profile::load_with_callback`].
///
/// The completion callback is released when this is dropped or joined.
#[must_use = "the callback runs once the pending load is dropped or joined"]
pub struct PendingLoad {
    release: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl PendingLoad {
    /// Release the callback and wait until it has run.
    pub fn join(self) -> thread::Result<()> {
        let PendingLoad { release, worker } = self;
        drop(release);
        worker.join()
    }
}

fn load_owned<R: Read>(
    mut stream: R,
    cancellable: Option<Cancellable>,
    options: &LoadOptions,
) -> (R, Result<Profile>) {
    let result = Profile::load_sync_with_options(
        &mut stream,
        cancellable.as_ref(),
        options,
    );
    (stream, result)
}
