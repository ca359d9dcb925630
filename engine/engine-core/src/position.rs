//! The complete game state at a decision point.
//!
//! A [`Position`] owns everything it needs: per-agent boards, the factories,
//! the centre, an ordered supply and the discard. Cloning is a deep copy.
//!
//! Searches mutate their own private copy with [`Position::play`] and restore
//! it with [`Position::undo`]. A drafting move records a small delta; the last
//! move of a round (which tiles walls, scores and refills the factories)
//! records a full snapshot instead.
//!
//! The supply is an ordered sequence and refills draw from its end. When it
//! runs dry the discard is shuffled back in with a generator seeded from the
//! bag seed and the round, so every transition is deterministic.

use crate::board::{PlayerBoard, WALL_SIZE};
use crate::error::EngineError;
use crate::moves::{DraftSource, Move, Placement};
use crate::tile::{Color, TileCounts, NUM_COLORS, TILES_PER_COLOR};
use crate::zobrist::{mix, FACTORY_CAPACITY, KEYS, MAX_AGENTS};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Factories used by a game with `agents` agents.
#[inline]
pub fn factory_count(agents: usize) -> usize {
    2 * agents + 1
}

fn check_agent_count(agents: usize) -> Result<(), EngineError> {
    if (2..=MAX_AGENTS).contains(&agents) {
        Ok(())
    } else {
        Err(EngineError::UnsupportedAgentCount(agents))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PositionParts", into = "PositionParts")]
pub struct Position {
    factories: Vec<TileCounts>,
    center: TileCounts,
    token_in_center: bool,
    boards: Vec<PlayerBoard>,
    supply: Vec<Color>,
    discard: TileCounts,
    to_move: u8,
    starter: u8,
    round: u16,
    bag_seed: u64,
    game_over: bool,
    hash: u64,
}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Reverts one [`Position::play`].
#[derive(Debug, Clone)]
pub struct Undo(UndoKind);

#[derive(Debug, Clone)]
enum UndoKind {
    Draft {
        source: DraftSource,
        source_before: TileCounts,
        center_before: TileCounts,
        token_in_center: bool,
        agent: u8,
        board_before: PlayerBoard,
        discard_before: TileCounts,
        hash: u64,
    },
    RoundEnd(Box<Position>),
}

impl Undo {
    /// True when the move this record reverts finished a round.
    pub fn crossed_round(&self) -> bool {
        matches!(self.0, UndoKind::RoundEnd(_))
    }
}

impl Position {
    /// Opening position: supply shuffled from `seed`, factories filled,
    /// agent 0 to move.
    pub fn new(agents: usize, seed: u64) -> Result<Self, EngineError> {
        check_agent_count(agents)?;

        let mut supply: Vec<Color> = Color::ALL
            .iter()
            .flat_map(|&c| std::iter::repeat(c).take(TILES_PER_COLOR as usize))
            .collect();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        supply.shuffle(&mut rng);

        let mut pos = Position {
            factories: vec![TileCounts::EMPTY; factory_count(agents)],
            center: TileCounts::EMPTY,
            token_in_center: true,
            boards: vec![PlayerBoard::new(); agents],
            supply,
            discard: TileCounts::EMPTY,
            to_move: 0,
            starter: 0,
            round: 1,
            bag_seed: seed,
            game_over: false,
            hash: 0,
        };
        pos.refill_factories();
        pos.hash = pos.compute_hash();
        Ok(pos)
    }

    /// Build from explicit parts, rejecting anything that breaks an invariant.
    pub fn from_parts(parts: PositionParts) -> Result<Self, EngineError> {
        check_agent_count(parts.boards.len())?;
        let agents = parts.boards.len();
        for agent in [parts.to_move, parts.starter] {
            if agent >= agents {
                return Err(EngineError::AgentOutOfRange { agent, agents });
            }
        }

        let mut pos = Position {
            factories: parts.factories,
            center: parts.center,
            token_in_center: parts.token_in_center,
            boards: parts.boards,
            supply: parts.supply,
            discard: parts.discard,
            to_move: parts.to_move as u8,
            starter: parts.starter as u8,
            round: parts.round,
            bag_seed: parts.bag_seed,
            game_over: parts.game_over,
            hash: 0,
        };
        pos.validate_structure()?;
        pos.hash = pos.compute_hash();
        Ok(pos)
    }

    pub fn to_parts(&self) -> PositionParts {
        PositionParts::from(self.clone())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[inline]
    pub fn agents(&self) -> usize {
        self.boards.len()
    }

    #[inline]
    pub fn to_move(&self) -> usize {
        self.to_move as usize
    }

    pub fn starter(&self) -> usize {
        self.starter as usize
    }

    pub fn round(&self) -> u16 {
        self.round
    }

    pub fn bag_seed(&self) -> u64 {
        self.bag_seed
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.game_over
    }

    pub fn factories(&self) -> &[TileCounts] {
        &self.factories
    }

    pub fn center(&self) -> &TileCounts {
        &self.center
    }

    pub fn token_in_center(&self) -> bool {
        self.token_in_center
    }

    /// # Panics
    ///
    /// Panics if `agent` is out of range; see [`Position::check_agent`].
    pub fn board(&self, agent: usize) -> &PlayerBoard {
        &self.boards[agent]
    }

    pub fn boards(&self) -> &[PlayerBoard] {
        &self.boards
    }

    pub fn supply(&self) -> &[Color] {
        &self.supply
    }

    pub fn discard(&self) -> &TileCounts {
        &self.discard
    }

    /// Realized score of `agent`. Panics if `agent` is out of range.
    #[inline]
    pub fn score(&self, agent: usize) -> i32 {
        self.boards[agent].score()
    }

    /// Incrementally maintained Zobrist key.
    #[inline]
    pub fn structural_hash(&self) -> u64 {
        self.hash
    }

    /// Tiles still available to draft this round.
    pub fn remaining_draftable(&self) -> usize {
        self.factories.iter().map(TileCounts::total).sum::<usize>() + self.center.total()
    }

    pub fn check_agent(&self, agent: usize) -> Result<(), EngineError> {
        if agent < self.agents() {
            Ok(())
        } else {
            Err(EngineError::AgentOutOfRange {
                agent,
                agents: self.agents(),
            })
        }
    }

    /// Tiles of `color` in `source`, or `None` for a factory that does not exist.
    pub fn source_counts(&self, source: DraftSource) -> Option<&TileCounts> {
        match source {
            DraftSource::Factory(i) => self.factories.get(i as usize),
            DraftSource::Center => Some(&self.center),
        }
    }

    /// Structural legality check shared by [`Position::play`] and the move
    /// generator.
    pub fn check_move(&self, mv: Move) -> Result<(), EngineError> {
        if self.game_over {
            return Err(EngineError::invalid(mv, "game is over"));
        }
        let counts = self
            .source_counts(mv.source)
            .ok_or_else(|| EngineError::invalid(mv, "no such factory"))?;
        if counts.get(mv.color) == 0 {
            return Err(EngineError::invalid(mv, "colour not present in source"));
        }
        let board = &self.boards[self.to_move()];
        match mv.target {
            Placement::Row(r) if (r as usize) < WALL_SIZE => {
                if board.accepts(r as usize, mv.color) {
                    Ok(())
                } else {
                    Err(EngineError::invalid(mv, "pattern line cannot take colour"))
                }
            }
            Placement::Row(_) => Err(EngineError::invalid(mv, "no such pattern line")),
            Placement::Floor => {
                if (0..WALL_SIZE).any(|r| board.accepts(r, mv.color)) {
                    Err(EngineError::invalid(mv, "a pattern line can take colour"))
                } else {
                    Ok(())
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Return the successor position, leaving `self` untouched.
    pub fn apply(&self, mv: Move) -> Result<Position, EngineError> {
        let mut next = self.clone();
        next.play(mv)?;
        Ok(next)
    }

    /// Play `mv` in place.
    pub fn play(&mut self, mv: Move) -> Result<Undo, EngineError> {
        self.check_move(mv)?;
        let taken = self
            .source_counts(mv.source)
            .map_or(0, |counts| counts.get(mv.color) as usize);

        if taken == self.remaining_draftable() {
            let snapshot = Box::new(self.clone());
            self.draft(mv)?;
            self.finish_round()?;
            self.hash = self.compute_hash();
            return Ok(Undo(UndoKind::RoundEnd(snapshot)));
        }

        let agent = self.to_move;
        let undo = UndoKind::Draft {
            source: mv.source,
            source_before: *self
                .source_counts(mv.source)
                .ok_or_else(|| EngineError::invalid(mv, "no such factory"))?,
            center_before: self.center,
            token_in_center: self.token_in_center,
            agent,
            board_before: self.boards[agent as usize],
            discard_before: self.discard,
            hash: self.hash,
        };
        self.draft(mv)?;
        Ok(Undo(undo))
    }

    /// Restore the position `play` was called on.
    pub fn undo(&mut self, undo: Undo) {
        match undo.0 {
            UndoKind::RoundEnd(snapshot) => *self = *snapshot,
            UndoKind::Draft {
                source,
                source_before,
                center_before,
                token_in_center,
                agent,
                board_before,
                discard_before,
                hash,
            } => {
                if let DraftSource::Factory(i) = source {
                    self.factories[i as usize] = source_before;
                }
                self.center = center_before;
                self.token_in_center = token_in_center;
                self.boards[agent as usize] = board_before;
                self.discard = discard_before;
                self.to_move = agent;
                self.hash = hash;
            }
        }
    }

    /// Take tiles and place them, keeping the hash in step.
    fn draft(&mut self, mv: Move) -> Result<(), EngineError> {
        let agent = self.to_move();
        let keys = &*KEYS;
        let mut hash = self.hash ^ keys.board(agent, &self.boards[agent]);
        hash ^= keys.center(&self.center) ^ keys.discard(&self.discard);
        if self.token_in_center {
            hash ^= keys.token_center();
        }

        let taken = match mv.source {
            DraftSource::Factory(i) => {
                let factory = &mut self.factories[i as usize];
                hash ^= keys.factory(i as usize, factory);
                let taken = factory.take_all(mv.color);
                self.center.merge(factory);
                *factory = TileCounts::EMPTY;
                taken
            }
            DraftSource::Center => {
                let taken = self.center.take_all(mv.color);
                if self.token_in_center {
                    self.token_in_center = false;
                    self.boards[agent].take_token();
                }
                taken
            }
        };
        if taken == 0 {
            return Err(EngineError::invariant(format!(
                "draft of {} took no tiles",
                mv
            )));
        }

        let board = &mut self.boards[agent];
        let outcome = match mv.target {
            Placement::Row(r) => board.place_in_row(r as usize, mv.color, taken),
            Placement::Floor => board.add_to_floor(mv.color, taken),
        };
        self.discard.add(mv.color, outcome.to_discard);

        hash ^= keys.board(agent, &self.boards[agent]);
        hash ^= keys.center(&self.center) ^ keys.discard(&self.discard);
        if self.token_in_center {
            hash ^= keys.token_center();
        }
        let next = (agent + 1) % self.agents();
        hash ^= keys.to_move(agent) ^ keys.to_move(next);
        self.to_move = next as u8;
        self.hash = hash;
        Ok(())
    }

    /// Tile walls, score, and either end the game or refill for the next round.
    fn finish_round(&mut self) -> Result<(), EngineError> {
        for agent in 0..self.agents() {
            let (to_discard, had_token) = self.boards[agent].tile_wall();
            self.discard.merge(&to_discard);
            if had_token {
                self.starter = agent as u8;
            }
        }
        self.token_in_center = true;
        self.to_move = self.starter;

        if self.boards.iter().any(PlayerBoard::has_complete_row) {
            self.end_game();
            return Ok(());
        }

        self.round = self
            .round
            .checked_add(1)
            .ok_or_else(|| EngineError::invariant("round counter overflow"))?;
        self.refill_factories();
        if self.factories.iter().all(TileCounts::is_empty) {
            self.end_game();
        }
        Ok(())
    }

    fn end_game(&mut self) {
        for board in &mut self.boards {
            board.apply_end_bonus();
        }
        self.game_over = true;
    }

    fn refill_factories(&mut self) {
        for i in 0..self.factories.len() {
            for _ in 0..FACTORY_CAPACITY {
                if self.supply.is_empty() {
                    if self.discard.is_empty() {
                        return;
                    }
                    self.recycle_discard();
                }
                if let Some(tile) = self.supply.pop() {
                    self.factories[i].add(tile, 1);
                }
            }
        }
    }

    /// Move the discard into the supply in a shuffled, reproducible order.
    fn recycle_discard(&mut self) {
        let mut tiles: Vec<Color> = self
            .discard
            .iter()
            .flat_map(|(c, n)| std::iter::repeat(c).take(n as usize))
            .collect();
        let mut rng = ChaCha20Rng::seed_from_u64(self.bag_seed ^ mix(self.round as u64));
        tiles.shuffle(&mut rng);
        self.supply.extend(tiles);
        self.discard = TileCounts::EMPTY;
    }

    // ------------------------------------------------------------------
    // Hashing and validation
    // ------------------------------------------------------------------

    /// Hash recomputed from scratch. Always equal to [`Position::structural_hash`].
    pub fn compute_hash(&self) -> u64 {
        let keys = &*KEYS;
        let mut h = 0;
        for (i, factory) in self.factories.iter().enumerate() {
            h ^= keys.factory(i, factory);
        }
        h ^= keys.center(&self.center) ^ keys.discard(&self.discard);
        if self.token_in_center {
            h ^= keys.token_center();
        }
        for (agent, board) in self.boards.iter().enumerate() {
            h ^= keys.board(agent, board);
        }
        h ^= keys.to_move(self.to_move());
        h ^= keys.round_facts(&self.supply, self.round, self.bag_seed, self.starter());
        if self.game_over {
            h = !h;
        }
        h
    }

    /// Check conservation, structural invariants and the stored hash.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.validate_structure()?;
        if self.hash != self.compute_hash() {
            return Err(EngineError::invariant("stored hash differs from recomputed hash"));
        }
        Ok(())
    }

    fn validate_structure(&self) -> Result<(), EngineError> {
        let agents = self.agents();
        check_agent_count(agents)?;
        if self.to_move() >= agents || self.starter() >= agents {
            return Err(EngineError::invariant("agent index out of range"));
        }
        if self.factories.len() != factory_count(agents) {
            return Err(EngineError::invariant(format!(
                "{} factories for {} agents",
                self.factories.len(),
                agents
            )));
        }
        if let Some(i) = self
            .factories
            .iter()
            .position(|f| f.total() > FACTORY_CAPACITY)
        {
            return Err(EngineError::invariant(format!("factory {} over capacity", i)));
        }

        for (agent, board) in self.boards.iter().enumerate() {
            for row in 0..WALL_SIZE {
                if board.wall_row(row) >= 1 << WALL_SIZE {
                    return Err(EngineError::invariant(format!(
                        "agent {} wall row {} has cells outside the grid",
                        agent, row
                    )));
                }
                let line = board.line(row);
                match line.color {
                    None if line.count != 0 => {
                        return Err(EngineError::invariant(format!(
                            "agent {} line {} has tiles but no colour",
                            agent, row
                        )))
                    }
                    Some(_) if line.count == 0 => {
                        return Err(EngineError::invariant(format!(
                            "agent {} line {} has a colour but no tiles",
                            agent, row
                        )))
                    }
                    Some(color) if board.wall_row_has_color(row, color) => {
                        return Err(EngineError::invariant(format!(
                            "agent {} line {} repeats a wall colour",
                            agent, row
                        )))
                    }
                    _ => {}
                }
                if line.count > crate::board::PatternLine::capacity(row) {
                    return Err(EngineError::invariant(format!(
                        "agent {} line {} over capacity",
                        agent, row
                    )));
                }
            }
            if board.floor().total() > crate::board::FLOOR_SLOTS {
                return Err(EngineError::invariant(format!(
                    "agent {} floor over capacity",
                    agent
                )));
            }
        }

        if !self.game_over && self.remaining_draftable() == 0 {
            return Err(EngineError::invariant(
                "game in progress with nothing left to draft",
            ));
        }

        let holders = self.token_in_center as usize
            + self.boards.iter().filter(|b| b.has_token()).count();
        if holders != 1 {
            return Err(EngineError::invariant(format!(
                "{} holders of the first-player token",
                holders
            )));
        }

        let totals = self.tile_totals();
        for (color, &n) in Color::ALL.iter().zip(totals.iter()) {
            if n != TILES_PER_COLOR as usize {
                return Err(EngineError::invariant(format!(
                    "{} {} tiles in play, expected {}",
                    n, color, TILES_PER_COLOR
                )));
            }
        }
        Ok(())
    }

    /// Tiles of each colour across every zone.
    pub fn tile_totals(&self) -> [usize; NUM_COLORS] {
        let mut totals = [0usize; NUM_COLORS];
        let mut add = |counts: &TileCounts| {
            for (color, n) in counts.iter() {
                totals[color.index()] += n as usize;
            }
        };
        self.factories.iter().for_each(&mut add);
        add(&self.center);
        add(&self.discard);
        for board in &self.boards {
            add(&board.tiles_by_color());
        }
        add(&TileCounts::from_tiles(&self.supply));
        totals
    }
}

/// Plain-data view of a [`Position`], used for serde and for building
/// positions by hand. Converting back validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionParts {
    pub factories: Vec<TileCounts>,
    pub center: TileCounts,
    pub token_in_center: bool,
    pub boards: Vec<PlayerBoard>,
    pub supply: Vec<Color>,
    pub discard: TileCounts,
    pub to_move: usize,
    pub starter: usize,
    pub round: u16,
    pub bag_seed: u64,
    pub game_over: bool,
}

impl PositionParts {
    /// Empty drafting area, token in the centre, every tile in the discard.
    pub fn empty(agents: usize) -> Self {
        Self {
            factories: vec![TileCounts::EMPTY; factory_count(agents)],
            center: TileCounts::EMPTY,
            token_in_center: true,
            boards: vec![PlayerBoard::new(); agents],
            supply: Vec::new(),
            discard: TileCounts::new([TILES_PER_COLOR; NUM_COLORS]),
            to_move: 0,
            starter: 0,
            round: 1,
            bag_seed: 0,
            game_over: false,
        }
    }

    /// Reset the discard so that every colour totals a full set again.
    /// Colours already over-represented elsewhere are left at zero and will
    /// fail validation.
    pub fn balance_discard(mut self) -> Self {
        let mut held = TileCounts::EMPTY;
        for factory in &self.factories {
            held.merge(factory);
        }
        held.merge(&self.center);
        for board in &self.boards {
            held.merge(&board.tiles_by_color());
        }
        held.merge(&TileCounts::from_tiles(&self.supply));
        for color in Color::ALL {
            self.discard
                .set(color, TILES_PER_COLOR.saturating_sub(held.get(color)));
        }
        self
    }
}

impl From<Position> for PositionParts {
    fn from(pos: Position) -> Self {
        Self {
            factories: pos.factories,
            center: pos.center,
            token_in_center: pos.token_in_center,
            boards: pos.boards,
            supply: pos.supply,
            discard: pos.discard,
            to_move: pos.to_move as usize,
            starter: pos.starter as usize,
            round: pos.round,
            bag_seed: pos.bag_seed,
            game_over: pos.game_over,
        }
    }
}

impl TryFrom<PositionParts> for Position {
    type Error = EngineError;

    fn try_from(parts: PositionParts) -> Result<Self, Self::Error> {
        Position::from_parts(parts)
    }
}
