use rill::prelude::*;
use rill::runtime;

#[test]
fn test_large_parallel_workload() {
    runtime::init_thread_local().unwrap();

    let sum = Seq::range(0i32..1_000_000)
        .parallel()
        .map(|x| x as i64)
        .reduce(0i64, |acc, x| acc + x, |a, b| a + b)
        .unwrap();

    assert_eq!(sum, 499_999_500_000);

    shutdown();
}

#[test]
fn test_parallel_equivalence_on_random_data() {
    use rand::Rng;

    runtime::init_thread_local().unwrap();

    let mut rng = rand::thread_rng();
    let data: Vec<i64> = (0..50_000).map(|_| rng.gen_range(-1000..1000)).collect();

    let sequential = Seq::from_vec(data.clone())
        .filter(|x| x % 3 != 0)
        .map(|x| x * 7)
        .reduce(0i64, |acc, x| acc + x, |a, b| a + b)
        .unwrap();

    let parallel = Seq::from_vec(data)
        .parallel()
        .filter(|x| x % 3 != 0)
        .map(|x| x * 7)
        .reduce(0i64, |acc, x| acc + x, |a, b| a + b)
        .unwrap();

    assert_eq!(sequential, parallel);

    shutdown();
}

#[test]
fn test_parallel_collect_equivalence_on_random_strings() {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    runtime::init_thread_local().unwrap();

    let mut rng = rand::thread_rng();
    let data: Vec<String> = (0..10_000)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(8)
                .map(char::from)
                .collect()
        })
        .collect();

    let sequential = Seq::from_vec(data.clone())
        .sorted()
        .collect(collectors::to_vec())
        .unwrap();

    let parallel = Seq::from_vec(data)
        .parallel()
        .sorted()
        .collect(collectors::to_vec())
        .unwrap();

    assert_eq!(sequential, parallel);

    shutdown();
}

#[test]
fn test_many_small_parallel_drives() {
    let config = Config::builder().num_threads(2).build().unwrap();
    runtime::init_thread_local_with_config(config).unwrap();

    for round in 0..100 {
        let count = Seq::range(0i32..64).parallel().count().unwrap();
        assert_eq!(count, 64, "round {round}");
    }

    shutdown();
}

#[test]
fn test_repeated_panic_propagation_is_clean() {
    runtime::init_thread_local().unwrap();

    for _ in 0..10 {
        let result = Seq::range(0i32..1000)
            .parallel()
            .map(|x| {
                if x == 500 {
                    panic!("boom");
                }
                x
            })
            .count();
        assert!(matches!(result, Err(Error::WorkerPanic(_))));
    }

    // the pool survives failed drives
    assert_eq!(Seq::range(0i32..1000).parallel().count().unwrap(), 1000);

    shutdown();
}

#[test]
fn test_deep_stage_chain() {
    let result = Seq::range(0i32..10_000)
        .map(|x| x + 1)
        .filter(|x| x % 2 == 0)
        .map(|x| x / 2)
        .filter(|x| x % 5 != 0)
        .distinct()
        .sorted_by(|a, b| b.cmp(a))
        .count()
        .unwrap();

    // 1..=5000 with multiples of 5 removed
    assert_eq!(result, 4000);
}
