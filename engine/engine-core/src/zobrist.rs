//! Zobrist keys for positions.
//!
//! Every atomic fact of a position (a colour count in a factory, the
//! contents of a pattern line, a wall cell, the floor, the token location,
//! the agent to move) owns a random 64-bit key. A position's hash is the XOR
//! of the keys of the facts that hold in it, so a mutation updates the hash
//! by XORing the old fact out and the new fact in.
//!
//! A count of zero always maps to key 0: empty zones contribute nothing.
//!
//! Facts that only change at round boundaries (score, supply order, round,
//! bag seed, round starter) are folded in through [`mix`] when the hash is
//! recomputed from scratch.

use crate::board::{PlayerBoard, FLOOR_SLOTS, WALL_SIZE};
use crate::tile::{Color, TileCounts, NUM_COLORS, TILES_PER_COLOR};
use once_cell::sync::Lazy;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Largest supported agent count.
pub const MAX_AGENTS: usize = 4;

/// Factories in a four-agent game.
pub const MAX_FACTORIES: usize = 2 * MAX_AGENTS + 1;

/// Tiles a factory holds after a refill.
pub const FACTORY_CAPACITY: usize = 4;

const ZOBRIST_SEED: u64 = 0x7E55_E7A0_2B1D_C0DE;

const POOL_COUNTS: usize = TILES_PER_COLOR as usize + 1;

/// Process-wide key table, generated once from a fixed seed.
pub static KEYS: Lazy<ZobristKeys> = Lazy::new(|| ZobristKeys::new(ZOBRIST_SEED));

pub struct ZobristKeys {
    factory: [[[u64; FACTORY_CAPACITY + 1]; NUM_COLORS]; MAX_FACTORIES],
    center: [[u64; POOL_COUNTS]; NUM_COLORS],
    discard: [[u64; POOL_COUNTS]; NUM_COLORS],
    token_center: u64,
    token_floor: [u64; MAX_AGENTS],
    line: [[[[u64; WALL_SIZE + 1]; NUM_COLORS]; WALL_SIZE]; MAX_AGENTS],
    wall: [[[u64; WALL_SIZE]; WALL_SIZE]; MAX_AGENTS],
    floor: [[[u64; FLOOR_SLOTS + 1]; NUM_COLORS]; MAX_AGENTS],
    score: [u64; MAX_AGENTS],
    to_move: [u64; MAX_AGENTS],
    perspective: [u64; MAX_AGENTS],
    round_facts: u64,
}

fn counted<const N: usize>(rng: &mut ChaCha20Rng) -> [u64; N] {
    std::array::from_fn(|count| if count == 0 { 0 } else { rng.next_u64() })
}

fn plain<const N: usize>(rng: &mut ChaCha20Rng) -> [u64; N] {
    std::array::from_fn(|_| rng.next_u64())
}

impl ZobristKeys {
    fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let rng = &mut rng;
        Self {
            factory: std::array::from_fn(|_| std::array::from_fn(|_| counted(rng))),
            center: std::array::from_fn(|_| counted(rng)),
            discard: std::array::from_fn(|_| counted(rng)),
            token_center: rng.next_u64(),
            token_floor: plain(rng),
            line: std::array::from_fn(|_| {
                std::array::from_fn(|_| std::array::from_fn(|_| counted(rng)))
            }),
            wall: std::array::from_fn(|_| std::array::from_fn(|_| plain(rng))),
            floor: std::array::from_fn(|_| std::array::from_fn(|_| counted(rng))),
            score: plain(rng),
            to_move: plain(rng),
            perspective: plain(rng),
            round_facts: rng.next_u64(),
        }
    }

    pub fn factory(&self, index: usize, counts: &TileCounts) -> u64 {
        counts
            .iter()
            .fold(0, |h, (c, n)| h ^ self.factory[index][c.index()][n as usize])
    }

    pub fn center(&self, counts: &TileCounts) -> u64 {
        counts
            .iter()
            .fold(0, |h, (c, n)| h ^ self.center[c.index()][n as usize])
    }

    pub fn discard(&self, counts: &TileCounts) -> u64 {
        counts
            .iter()
            .fold(0, |h, (c, n)| h ^ self.discard[c.index()][n as usize])
    }

    #[inline]
    pub fn token_center(&self) -> u64 {
        self.token_center
    }

    #[inline]
    pub fn to_move(&self, agent: usize) -> u64 {
        self.to_move[agent]
    }

    /// Key XORed into transposition probes so that searches run for
    /// different agents never share entries.
    #[inline]
    pub fn perspective(&self, agent: usize) -> u64 {
        self.perspective[agent]
    }

    /// Everything on one agent's board, score included.
    pub fn board(&self, agent: usize, board: &PlayerBoard) -> u64 {
        let mut h = 0;
        for (row, line) in board.lines().iter().enumerate() {
            if let Some(color) = line.color {
                h ^= self.line[agent][row][color.index()][line.count as usize];
            }
            let wall = board.wall_row(row);
            for col in 0..WALL_SIZE {
                if wall & (1 << col) != 0 {
                    h ^= self.wall[agent][row][col];
                }
            }
        }
        for (color, n) in board.floor().iter() {
            h ^= self.floor[agent][color.index()][n as usize];
        }
        if board.has_token() {
            h ^= self.token_floor[agent];
        }
        h ^ mix(self.score[agent] ^ board.score() as u32 as u64)
    }

    /// Facts fixed for the duration of a round.
    pub fn round_facts(&self, supply: &[Color], round: u16, bag_seed: u64, starter: usize) -> u64 {
        let mut h = mix(self.round_facts ^ ((round as u64) << 8) ^ starter as u64);
        h ^= mix(bag_seed.wrapping_add(self.round_facts));
        for (i, &tile) in supply.iter().enumerate() {
            h = mix(h ^ ((i as u64) << 8) ^ tile.index() as u64);
        }
        h
    }
}

/// SplitMix64 finaliser.
#[inline]
pub fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
