use crate::error::RecoveryError;
use crate::observer::RecoveryObserver;
use futures::future::BoxFuture;
use std::fmt::Display;

/// A boxed fallback option, so differently-typed closures can share one `Vec`.
///
/// ```
/// use futures::FutureExt;
/// use recovery_rs::asynchronous::FallbackOption;
///
/// let options: Vec<FallbackOption<'static, u32, String>> = vec![
///     Box::new(|| async { Err::<u32, _>("primary down".to_string()) }.boxed()),
///     Box::new(|| async { Ok::<_, String>(7) }.boxed()),
/// ];
/// assert_eq!(options.len(), 2);
/// ```
pub type FallbackOption<'a, T, E> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<T, E>> + Send + 'a>;

/// Tries `operations` in order and returns the first success.
///
/// Each option is only constructed and started after every earlier option has
/// failed. Every failure is kept for the aggregate error.
pub(crate) async fn fallback_observed<I, F, Fut, T, E>(
    operations: I,
    context: &str,
    observer: &dyn RecoveryObserver,
) -> Result<T, RecoveryError<E>>
where
    I: IntoIterator<Item = F>,
    I::IntoIter: ExactSizeIterator,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let operations = operations.into_iter();
    let total = operations.len();
    let mut errors = Vec::with_capacity(total);

    for (index, operation) in operations.enumerate() {
        observer.fallback_attempt(context, index + 1, total);
        match operation().await {
            Ok(output) => return Ok(output),
            Err(err) => {
                observer.fallback_failed(context, index + 1, &err);
                errors.push(err);
            }
        }
    }

    observer.fallback_exhausted(context, errors.len());
    Err(RecoveryError::FallbackExhausted {
        context: context.to_string(),
        errors,
    })
}
