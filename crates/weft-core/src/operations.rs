//! Operations - 複数の `RemoteResult` をまとめて扱う
//!
//! どれも決定的です。「終わった順」は壁時計ではなく、結果が history に記録された位置
//! （`Ordered::position`）で決まります。位置の無い結果は呼び出し順で扱います。

use crate::domain::{Interrupt, Ordered, RemoteResult};

/// pending なら suspend。解決済みなら失敗でも `Ok(())`
///
/// 失敗を例外にするのは `.result()` の役目です。
pub fn wait<T>(result: &RemoteResult<T>) -> Result<(), Interrupt> {
    if result.is_pending() {
        return Err(Interrupt::Suspend);
    }
    Ok(())
}

/// 最初に解決した結果。全部 pending（または空）なら suspend
pub fn first<T, I>(results: I) -> Result<RemoteResult<T>, Interrupt>
where
    I: IntoIterator,
    I::Item: Into<Ordered<T>>,
{
    finish_order(results)
        .into_iter()
        .map(Ordered::into_inner)
        .find(RemoteResult::is_resolved)
        .ok_or(Interrupt::Suspend)
}

/// 終わった順に並べ替える
///
/// 位置つきの解決済み結果が位置順で先頭、位置の無い解決済み結果が呼び出し順で続き、
/// pending は呼び出し順で最後。
pub fn finish_order<T, I>(results: I) -> Vec<Ordered<T>>
where
    I: IntoIterator,
    I::Item: Into<Ordered<T>>,
{
    let mut ordered: Vec<Ordered<T>> = results.into_iter().map(Into::into).collect();
    ordered.sort_by_key(|r| match (r.result().is_pending(), r.position()) {
        (false, Some(position)) => (0, position),
        (false, None) => (1, 0),
        (true, _) => (2, 0),
    });
    ordered
}

/// 終わった順に値を畳み込む
///
/// 1 つでも pending なら suspend。そうでなければ終わった順に `f` を適用し、
/// 最初に出会った失敗を返す。
pub fn parallel_reduce<T, A, I, F>(results: I, init: A, mut f: F) -> Result<A, Interrupt>
where
    I: IntoIterator,
    I::Item: Into<Ordered<T>>,
    F: FnMut(A, T) -> A,
{
    let ordered = finish_order(results);
    if ordered.iter().any(|r| r.result().is_pending()) {
        return Err(Interrupt::Suspend);
    }
    ordered
        .into_iter()
        .try_fold(init, |acc, r| -> Result<A, Interrupt> {
            Ok(f(acc, r.into_inner().result()?))
        })
}

/// すべての値を集める
///
/// 1 つでも pending なら suspend。pending が無ければ、呼び出し順で最初の失敗を返す。
pub fn all<T, I>(results: I) -> Result<Vec<T>, Interrupt>
where
    I: IntoIterator<Item = RemoteResult<T>>,
{
    let results: Vec<RemoteResult<T>> = results.into_iter().collect();
    if results.iter().any(RemoteResult::is_pending) {
        return Err(Interrupt::Suspend);
    }
    results.into_iter().map(RemoteResult::result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn at(result: RemoteResult<u8>, position: u64) -> Ordered<u8> {
        Ordered::new(result, Some(position))
    }

    fn pending() -> Ordered<u8> {
        Ordered::new(RemoteResult::Pending, None)
    }

    #[test]
    fn wait_suspends_only_on_pending() {
        assert!(wait(&RemoteResult::<u8>::Pending).unwrap_err().is_suspend());
        assert!(wait(&RemoteResult::Value(1)).is_ok());
        assert!(wait(&RemoteResult::<u8>::Failed("boom".into())).is_ok());
        assert!(wait(&RemoteResult::<u8>::TimedOut).is_ok());
    }

    #[rstest]
    #[case(vec![RemoteResult::Pending, RemoteResult::Value(2), RemoteResult::Value(3)], RemoteResult::Value(2))]
    #[case(vec![RemoteResult::Failed("x".into()), RemoteResult::Value(3)], RemoteResult::Failed("x".into()))]
    #[case(vec![RemoteResult::Pending, RemoteResult::TimedOut], RemoteResult::TimedOut)]
    fn first_picks_earliest_resolved_in_call_order(
        #[case] results: Vec<RemoteResult<u8>>,
        #[case] expected: RemoteResult<u8>,
    ) {
        assert_eq!(first::<u8, _>(results).unwrap(), expected);
    }

    #[rstest]
    #[case(vec![at(RemoteResult::Value(1), 9), at(RemoteResult::Value(2), 4)], RemoteResult::Value(2))]
    #[case(vec![pending(), at(RemoteResult::Failed("x".into()), 7), at(RemoteResult::Value(3), 8)], RemoteResult::Failed("x".into()))]
    #[case(vec![RemoteResult::Value(5).into(), at(RemoteResult::TimedOut, 12)], RemoteResult::TimedOut)]
    fn first_picks_earliest_in_history(
        #[case] results: Vec<Ordered<u8>>,
        #[case] expected: RemoteResult<u8>,
    ) {
        assert_eq!(first::<u8, _>(results).unwrap(), expected);
    }

    #[rstest]
    #[case(vec![RemoteResult::Pending, RemoteResult::Pending])]
    #[case(vec![])]
    fn first_suspends_when_nothing_resolved(#[case] results: Vec<RemoteResult<u8>>) {
        assert!(first::<u8, _>(results).unwrap_err().is_suspend());
    }

    #[rstest]
    #[case::history_order(
        vec![at(RemoteResult::Value(1), 6), at(RemoteResult::Value(2), 3), at(RemoteResult::Value(3), 5)],
        vec![2, 3, 1]
    )]
    #[case::pending_last(
        vec![pending(), at(RemoteResult::Value(2), 3), at(RemoteResult::Failed("x".into()), 2)],
        vec![3, 2, 1]
    )]
    #[case::unpositioned_after_positioned(
        vec![RemoteResult::Value(1).into(), pending(), at(RemoteResult::Value(3), 8)],
        vec![3, 1, 2]
    )]
    #[case::empty(vec![], vec![])]
    fn finish_order_sorts_by_history_position(
        #[case] results: Vec<Ordered<u8>>,
        #[case] expected_calls: Vec<usize>,
    ) {
        // 呼び出し順（1 始まり）で期待値を書く
        let expected: Vec<Ordered<u8>> = expected_calls
            .iter()
            .map(|&call| results[call - 1].clone())
            .collect();
        assert_eq!(finish_order(results), expected);
    }

    #[rstest]
    #[case::concatenates_in_finish_order(
        vec![at(RemoteResult::Value(1), 6), at(RemoteResult::Value(2), 3), at(RemoteResult::Value(3), 5)],
        "231"
    )]
    #[case::single(vec![at(RemoteResult::Value(7), 2)], "7")]
    #[case::nothing_to_fold(vec![], "")]
    fn parallel_reduce_folds_in_finish_order(
        #[case] results: Vec<Ordered<u8>>,
        #[case] expected: &str,
    ) {
        let folded = parallel_reduce(results, String::new(), |mut acc, v: u8| {
            acc.push_str(&v.to_string());
            acc
        })
        .unwrap();
        assert_eq!(folded, expected);
    }

    #[rstest]
    #[case::pending_input(
        vec![at(RemoteResult::Value(1), 2), pending()],
        None
    )]
    #[case::pending_beats_failure(
        vec![at(RemoteResult::Failed("boom".into()), 2), pending()],
        None
    )]
    #[case::earliest_failure_in_history(
        vec![at(RemoteResult::Failed("late".into()), 9), at(RemoteResult::TimedOut, 4)],
        Some(TaskError::TimedOut)
    )]
    fn parallel_reduce_interrupts(
        #[case] results: Vec<Ordered<u8>>,
        #[case] expected: Option<TaskError>,
    ) {
        let err = parallel_reduce(results, 0u32, |acc, v: u8| acc + u32::from(v)).unwrap_err();
        match expected {
            None => assert!(err.is_suspend()),
            Some(task_error) => assert_eq!(err.task_error(), Some(&task_error)),
        }
    }

    #[test]
    fn all_collects_values() {
        let values = all(vec![RemoteResult::Value(1), RemoteResult::Value(2)]).unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn all_suspends_before_raising_failures() {
        let err = all(vec![
            RemoteResult::<u8>::Failed("boom".into()),
            RemoteResult::Pending,
        ])
        .unwrap_err();
        assert!(err.is_suspend());
    }

    #[test]
    fn all_raises_first_failure() {
        let err = all(vec![
            RemoteResult::Value(1),
            RemoteResult::TimedOut,
            RemoteResult::Failed("later".into()),
        ])
        .unwrap_err();
        assert_eq!(err.task_error(), Some(&TaskError::TimedOut));
    }
}
