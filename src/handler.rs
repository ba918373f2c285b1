// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::error::Result;
use crate::level::Rank;
use crate::log_record::LogRecord;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Handler::emit_async`].
pub type EmitFuture<'s> = Pin<Box<dyn Future<Output = Result<()>> + Send + 's>>;

pub trait Handler: Debug + Send + Sync {
    /**
        Renders the record and writes it out.

        Called only for records at or above [`Self::threshold`].
    */
    fn emit(&self, record: &LogRecord) -> Result<()>;

    /**
    Called on the logging thread before [`Self::emit`] or [`Self::emit_async`].

    Anything that must be taken at the call site, such as a backtrace, is taken here.
    */
    fn prepare(&self, _record: &LogRecord) {}

    /**
    Renders and writes the record asynchronously.

    This allows handlers to reuse an async context that already exists.
    The default implementation wraps [`Self::emit`].
    */
    fn emit_async<'s>(&'s self, record: &'s LogRecord) -> EmitFuture<'s> {
        Box::pin(async move { self.emit(record) })
    }

    /**
    Records below this rank are not passed to the handler.
    */
    fn threshold(&self) -> Rank {
        Rank(0)
    }

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self);
}

/*
Boilerplate notes.

# Handler

Clone makes no sense for handlers that own a file or a stream, so it's out.
PartialEq and Eq are possible but it's unclear whether we mean the destination or the configuration. Not implemented.
Ord makes no sense.
Default is not sensible since a handler needs a formatter, and a file handler needs a path.
Send/Sync are required: one handler serves every thread of the logger it's attached to.
*/
