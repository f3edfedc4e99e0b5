#![no_main]

use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use emumon::WatchpointPool;

#[derive(Arbitrary, Debug)]
enum PoolOp {
    Allocate(u32),
    Release(u8),
}

fuzz_target!(|ops: Vec<PoolOp>| {
    let mut pool = WatchpointPool::with_capacity(8);

    for op in ops {
        match op {
            PoolOp::Allocate(value) => {
                if !pool.is_full() {
                    pool.allocate("1", value);
                }
            }
            PoolOp::Release(id) => {
                pool.release(usize::from(id));
            }
        }
        assert!(pool.is_partitioned());
    }
});
