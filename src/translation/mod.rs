/*!
 * Translation pipeline core.
 *
 * - `batch`: size-bounded grouping of entries
 * - `dispatch`: sequential requests with retry, backoff and cancellation
 * - `reconstruct`: positional mapping of replies back onto keys
 * - `prompts`: system instruction for the backend
 */

pub use self::batch::{Batch, Batcher};
pub use self::dispatch::{Dispatcher, RetryPolicy, TranslatedBatch, TranslatedPair};
pub use self::reconstruct::{KeyDivergence, key_divergences, reconstruct};

pub mod batch;
pub mod dispatch;
pub mod prompts;
pub mod reconstruct;
