use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablib::tablib::{
    ConcatOptions, MoveRange, TableFunction, UnpackRange, concat, insert, move_range, remove,
    sort, unpack,
};
use tablib::vm::{Table, VM, Value};

fn list(len: i64) -> Value {
    Value::Table(Table::from_values((1..=len).map(Value::Integer)).into_ref())
}

fn scrambled(len: i64) -> Value {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let values = (0..len).map(|_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        Value::Integer((state % 1_000_000) as i64)
    });
    Value::Table(Table::from_values(values).into_ref())
}

// ============================================================================
// Sort Benchmarks
// ============================================================================

fn benchmark_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("native_order", size), &size, |b, &size| {
            let mut vm = VM::new();
            b.iter_batched(
                || scrambled(size),
                |t| sort(&mut vm, black_box(&t), None).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    // Comparator calls go through the host call path
    let descending = Value::function("descending", |vm, args| {
        Ok(vec![Value::Boolean(vm.less_than(&args[1], &args[0])?)])
    });
    group.bench_function("comparator_1000", |b| {
        let mut vm = VM::new();
        b.iter_batched(
            || scrambled(1_000),
            |t| sort(&mut vm, black_box(&t), Some(&descending)).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("presorted_10000", |b| {
        let mut vm = VM::new();
        b.iter_batched(
            || list(10_000),
            |t| sort(&mut vm, black_box(&t), None).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Mutator Benchmarks
// ============================================================================

fn benchmark_mutators(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutators");

    group.bench_function("append_1000", |b| {
        let mut vm = VM::new();
        b.iter_batched(
            || list(0),
            |t| {
                for i in 0..1_000 {
                    insert(&mut vm, &t, None, Value::Integer(i)).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("insert_front_1000", |b| {
        let mut vm = VM::new();
        b.iter_batched(
            || list(1_000),
            |t| insert(&mut vm, black_box(&t), Some(1), Value::Integer(0)).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("remove_front_1000", |b| {
        let mut vm = VM::new();
        b.iter_batched(
            || list(1_000),
            |t| remove(&mut vm, black_box(&t), Some(1)).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("move_overlapping_1000", |b| {
        let mut vm = VM::new();
        let range = MoveRange {
            first: 1,
            last: 1_000,
            dest: 2,
        };
        b.iter_batched(
            || list(1_000),
            |t| move_range(&mut vm, black_box(&t), range, None).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Transfer Benchmarks
// ============================================================================

fn benchmark_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");

    let numbers = list(1_000);
    group.bench_function("concat_1000", |b| {
        let mut vm = VM::new();
        let options = ConcatOptions::separator(",");
        b.iter(|| concat(&mut vm, black_box(&numbers), &options).unwrap());
    });

    group.bench_function("unpack_1000", |b| {
        let mut vm = VM::new();
        b.iter(|| unpack(&mut vm, black_box(&numbers), UnpackRange::default()).unwrap());
    });

    // Through the dynamically-typed entry points
    let args: Vec<Value> = (0..100).map(Value::Integer).collect();
    group.bench_function("pack_unpack_100", |b| {
        let mut vm = VM::new();
        b.iter(|| {
            let packed = TableFunction::Pack.call(&mut vm, black_box(&args)).unwrap();
            TableFunction::Unpack.call(&mut vm, &packed).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_sort, benchmark_mutators, benchmark_transfer);
criterion_main!(benches);
