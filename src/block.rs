/// Number of sparse slots per page.
pub const PAGE_SIZE: usize = 128;

/// One page of a sparse array: dense positions for 128 consecutive entity
/// indices. A slot is meaningful only while its presence bit is set.
pub struct Block {
    pub presence_mask: u128,
    pub data: [u32; PAGE_SIZE],
}

impl Block {
    pub fn new() -> Self {
        Block {
            presence_mask: 0,
            data: [0; PAGE_SIZE],
        }
    }

    #[inline(always)]
    pub fn get(&self, offset: usize) -> Option<usize> {
        if (self.presence_mask >> offset) & 1 == 1 {
            Some(self.data[offset] as usize)
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn set(&mut self, offset: usize, position: usize) {
        self.data[offset] = position as u32;
        self.presence_mask |= 1u128 << offset;
    }

    #[inline(always)]
    pub fn unset(&mut self, offset: usize) {
        self.presence_mask &= !(1u128 << offset);
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.presence_mask == 0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.presence_mask.count_ones() as usize
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
