//! Refresh coordination: the singleflight refresh cycle shared by suspended callers.
//!
//! [`RefreshCoordinator`] guarantees two properties for auth-required requests that
//! hit an unauthorized response: at most one provider refresh is in flight at any
//! time, and every suspended caller eventually resolves with a replayed response, a
//! refresh failure, or a shutdown error. The in-flight cycle is one shared future
//! that every suspended caller polls, so the cycle keeps making progress as long as
//! any waiter is alive: a caller cancelled mid-wait (timeout, task abort) neither
//! strands the remaining waiters nor wedges the coordinator in a refreshing state.
//! The cycle slot lives behind one mutex; joining an in-flight cycle and starting a
//! fresh one are each a single locked region, so two callers can never start
//! duplicate refreshes.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures::{
	FutureExt,
	future::{self, Aborted, BoxFuture, Shared},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthProvider, RefreshError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	request::{ApiRequest, ApiResponse},
};

/// Boxed future returned by [`ReplayDispatch::replay`].
pub type ReplayFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Replay seam the coordinator uses to re-issue suspended requests.
///
/// Implementations must treat a second unauthorized response as terminal instead of
/// routing it back into the coordinator; that bounds the protocol to one refresh
/// cycle per request and rules out refresh loops.
pub trait ReplayDispatch
where
	Self: Send + Sync,
{
	/// Re-issues the original request once, with a freshly read token attached.
	fn replay(&self, request: ApiRequest) -> ReplayFuture<'_>;
}

/// Terminal state of one refresh cycle, observed by every waiter that joined it.
#[derive(Clone)]
enum CycleOutcome {
	Refreshed,
	Failed(Arc<RefreshError>),
	Shutdown,
}

/// Cloneable handle every waiter polls; completes exactly once per cycle.
type CycleFuture = Shared<BoxFuture<'static, CycleOutcome>>;

struct RefreshCycle {
	generation: u64,
	future: CycleFuture,
	abort: future::AbortHandle,
}

struct CoordinatorShared {
	cycle: Option<RefreshCycle>,
	generation: u64,
	closed: bool,
}

/// Coordinates bearer-token refresh cycles for one API client.
///
/// One instance per client, never a process-wide singleton; the instance owns the
/// cycle slot exclusively.
pub struct RefreshCoordinator {
	provider: Arc<dyn AuthProvider>,
	shared: Mutex<CoordinatorShared>,
	metrics: Arc<RefreshMetrics>,
}
impl RefreshCoordinator {
	/// Creates a coordinator bound to the provided credential source.
	pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
		Self {
			provider,
			shared: Mutex::new(CoordinatorShared { cycle: None, generation: 0, closed: false }),
			metrics: Default::default(),
		}
	}

	/// Returns the shared refresh counters.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// Suspends an auth-required request that received an unauthorized response.
	///
	/// The caller joins the in-flight refresh cycle, starting one when the slot is
	/// empty. Every waiter polls the same shared cycle future, so whichever waiter
	/// is still alive drives the provider refresh to completion; after the cycle
	/// resolves, each surviving waiter replays its own request once. Resolves with
	/// the replayed response, [`Error::RefreshFailed`], or
	/// [`Error::ShutdownDuringRefresh`].
	pub async fn handle_unauthorized<D>(
		&self,
		request: ApiRequest,
		dispatcher: &D,
	) -> Result<ApiResponse>
	where
		D: ?Sized + ReplayDispatch,
	{
		let (generation, cycle) = {
			let mut shared = self.shared.lock();

			if shared.closed {
				return Err(Error::ShutdownDuringRefresh);
			}

			match &shared.cycle {
				Some(cycle) => (cycle.generation, cycle.future.clone()),
				None => self.start_cycle(&mut shared),
			}
		};
		let outcome = cycle.await;

		self.retire_cycle(generation);

		match outcome {
			CycleOutcome::Refreshed => dispatcher.replay(request).await,
			CycleOutcome::Failed(err) => Err(Error::RefreshFailed { reason: err.to_string() }),
			CycleOutcome::Shutdown => Err(Error::ShutdownDuringRefresh),
		}
	}

	/// Resolves every waiter suspended on the in-flight cycle with a shutdown error
	/// and rejects calls that would join afterwards.
	///
	/// Aborting the cycle settles the shared future, so waiters unwind even when
	/// the provider refresh itself never completes.
	pub fn shutdown(&self) {
		let cycle = {
			let mut shared = self.shared.lock();

			shared.closed = true;

			shared.cycle.take()
		};

		if let Some(cycle) = cycle {
			cycle.abort.abort();
		}
	}

	/// Starts a refresh cycle and stores its shared handle in the slot.
	///
	/// The returned future owns its provider handle, so it keeps running no matter
	/// which waiter polls it; the cycle records its own metrics exactly once.
	fn start_cycle(&self, shared: &mut CoordinatorShared) -> (u64, CycleFuture) {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh_cycle");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_attempt();

		let provider = self.provider.clone();
		let metrics = self.metrics.clone();
		let (refresh, abort) = future::abortable(async move { provider.refresh().await });
		let future = span
			.instrument(async move {
				match refresh.await {
					Ok(Ok(_)) => {
						obs::record_call_outcome(KIND, CallOutcome::Success);
						metrics.record_success();

						CycleOutcome::Refreshed
					},
					Ok(Err(err)) => {
						obs::record_call_outcome(KIND, CallOutcome::Failure);
						metrics.record_failure();

						CycleOutcome::Failed(Arc::new(err))
					},
					Err(Aborted) => {
						obs::record_call_outcome(KIND, CallOutcome::Failure);
						metrics.record_failure();

						CycleOutcome::Shutdown
					},
				}
			})
			.boxed()
			.shared();

		shared.generation += 1;
		shared.cycle =
			Some(RefreshCycle { generation: shared.generation, future: future.clone(), abort });

		(shared.generation, future)
	}

	/// Clears the slot once a waiter observed the cycle's completion.
	///
	/// Guarded by the generation so a slow waiter from a finished cycle can never
	/// evict a newer in-flight one; a caller arriving after this point finds the
	/// slot empty and starts a fresh cycle.
	fn retire_cycle(&self, generation: u64) {
		let mut shared = self.shared.lock();

		if shared.cycle.as_ref().is_some_and(|cycle| cycle.generation == generation) {
			shared.cycle = None;
		}
	}
}
impl Drop for RefreshCoordinator {
	fn drop(&mut self) {
		self.shutdown();
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let shared = self.shared.lock();

		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &shared.cycle.is_some())
			.field("generation", &shared.generation)
			.field("closed", &shared.closed)
			.finish()
	}
}
