//! Session hooks consumed by the UI layer: logout with loop protection and error notification.
//!
//! A 401 that survives the refresh-and-retry cycle means the session is gone. Callers route such
//! errors to [`Session::handle_logout`] and everything else to [`Session::handle_error`];
//! [`Session::handle_api_error`] does the routing for them.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{_prelude::*, auth::TokenStore};

/// Error type a hook may report; hook failures are logged and never propagate.
pub type HookError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by a [`LogoutHandler`].
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send>>;

/// Replaceable logout routine.
pub type LogoutHandler = Arc<dyn Fn() -> HookFuture + Send + Sync>;

/// Replaceable error notification routine (toast, crash reporter).
pub type ErrorHandler = Arc<dyn Fn(&Error) -> Result<(), HookError> + Send + Sync>;

/// Wraps an async closure as a [`LogoutHandler`].
pub fn logout_fn<F, Fut, E>(f: F) -> LogoutHandler
where
	F: 'static + Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<(), E>>,
	E: 'static + Into<HookError>,
{
	Arc::new(move || {
		let pending = f();

		Box::pin(async move { pending.await.map_err(Into::<HookError>::into) }) as HookFuture
	})
}

/// Wraps a closure as an [`ErrorHandler`].
pub fn error_fn<F, E>(f: F) -> ErrorHandler
where
	F: 'static + Send + Sync + Fn(&Error) -> Result<(), E>,
	E: Into<HookError>,
{
	Arc::new(move |error: &Error| f(error).map_err(Into::<HookError>::into))
}

/// Logout and error hooks bound to one token store.
pub struct Session {
	tokens: Arc<TokenStore>,
	logout_handler: RwLock<Option<LogoutHandler>>,
	error_handler: RwLock<Option<ErrorHandler>>,
	logging_out: AtomicBool,
}
impl Session {
	/// Creates hooks whose default logout clears `tokens`.
	pub fn new(tokens: Arc<TokenStore>) -> Self {
		Self {
			tokens,
			logout_handler: RwLock::new(None),
			error_handler: RwLock::new(None),
			logging_out: AtomicBool::new(false),
		}
	}

	/// Installs a logout handler; `None` restores the default, which clears the stored tokens.
	pub fn set_logout_handler(&self, handler: Option<LogoutHandler>) {
		*self.logout_handler.write() = handler;
	}

	/// Installs an error handler; `None` falls back to logging.
	pub fn set_error_handler(&self, handler: Option<ErrorHandler>) {
		*self.error_handler.write() = handler;
	}

	/// Returns `true` once a logout has run and [`Session::reset`] has not been called since.
	pub fn is_logging_out(&self) -> bool {
		self.logging_out.load(Ordering::Acquire)
	}

	/// Re-arms [`Session::handle_logout`] after a new sign-in.
	pub fn reset(&self) {
		self.logging_out.store(false, Ordering::Release);
	}

	/// Runs the logout handler once; returns `false` when a logout already ran.
	pub async fn handle_logout(&self) -> bool {
		if self.logging_out.swap(true, Ordering::AcqRel) {
			tracing::debug!("Logout already in progress; ignoring.");

			return false;
		}

		let handler = self.logout_handler.read().clone();

		match handler {
			Some(handler) =>
				if let Err(e) = handler().await {
					tracing::warn!(error = %e, "Logout handler failed.");
				},
			None => self.tokens.clear_tokens().await,
		}

		true
	}

	/// Forwards `error` to the error handler, logging it when none is set or the handler fails.
	pub fn handle_error(&self, error: &Error) {
		let handler = self.error_handler.read().clone();

		if let Some(handler) = handler {
			match handler(error) {
				Ok(()) => return,
				Err(e) => tracing::error!(error = %e, "Error handler failed."),
			}
		}

		tracing::error!(error = %error, status = error.status(), "Unhandled API error.");
	}

	/// Logs out on unrecoverable 401s and notifies the error handler otherwise.
	pub async fn handle_api_error(&self, error: &Error) {
		if Self::is_unauthorized(error) {
			self.handle_logout().await;
		} else {
			self.handle_error(error);
		}
	}

	/// Returns `true` for errors that should end the session.
	pub fn is_unauthorized(error: &Error) -> bool {
		error.is_unauthorized()
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("logout_handler_set", &self.logout_handler.read().is_some())
			.field("error_handler_set", &self.error_handler.read().is_some())
			.field("logging_out", &self.is_logging_out())
			.finish()
	}
}
