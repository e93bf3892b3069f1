use std::hash::{BuildHasher, Hasher};

/// Identity hasher for maps keyed by ids we hand out ourselves.
/// Event ids and task ids are sequential, so hashing them is wasted work.
#[derive(Default)]
pub(crate) struct NoopHasher(u64);

impl BuildHasher for NoopHasher {
    type Hasher = NoopHasher;
    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        NoopHasher(self.0)
    }
}

impl Hasher for NoopHasher {
    fn finish(&self) -> u64 {
        self.0
    }
    fn write(&mut self, _: &[u8]) {
        unimplemented!("NoopHasher is only used with integer keys")
    }
    fn write_usize(&mut self, i: usize) {
        self.0 = i as u64;
    }
    fn write_u32(&mut self, i: u32) {
        self.0 = u64::from(i);
    }
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}
