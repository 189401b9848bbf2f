//! Card grids and the per-room ownership registry.
//!
//! A room owns one [`CardRegistry`]. Grids are generated lazily, on the
//! first time a card slot is claimed, with a fresh OS-seeded RNG, so a
//! previous room's grids never leak into a new one.

use std::collections::HashMap;

use bingohall_protocol::{CardId, PlayerId, SelectedCard, FREE_CELL};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::RoomError;

/// Cards are 5×5.
pub const GRID_SIZE: usize = 5;

/// Row/column of the free cell.
const CENTER: usize = 2;

/// Numbers per column range (B 1–15, I 16–30, ...).
const COLUMN_SPAN: u8 = 15;

// ---------------------------------------------------------------------------
// CardGrid
// ---------------------------------------------------------------------------

/// An immutable 5×5 card.
///
/// Column `c` holds numbers from `15*c + 1 ..= 15*(c+1)`, without
/// duplicates; the center cell is [`FREE_CELL`]. Grids never change once
/// generated: marking is the client's business, validation happens
/// against the drawn set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardGrid {
    cells: [[u8; GRID_SIZE]; GRID_SIZE],
}

impl CardGrid {
    /// Generates a fresh grid: per-column shuffle without replacement
    /// over the standard ranges.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cells = [[FREE_CELL; GRID_SIZE]; GRID_SIZE];
        for col in 0..GRID_SIZE {
            let low = COLUMN_SPAN * col as u8 + 1;
            let mut pool: Vec<u8> = (low..low + COLUMN_SPAN).collect();
            pool.shuffle(rng);
            let mut next = pool.into_iter();
            for row in 0..GRID_SIZE {
                if row == CENTER && col == CENTER {
                    continue;
                }
                cells[row][col] = next.next().expect("column pool holds 15 numbers");
            }
        }
        Self { cells }
    }

    /// Builds a grid from explicit cells. Used when a room is rebuilt
    /// from persisted state and by validator tests; the caller is
    /// responsible for the cells honoring the column ranges.
    pub fn from_cells(cells: [[u8; GRID_SIZE]; GRID_SIZE]) -> Self {
        Self { cells }
    }

    /// The raw cells, as they appear on the wire.
    pub fn cells(&self) -> [[u8; GRID_SIZE]; GRID_SIZE] {
        self.cells
    }

    /// The number at (row, col). The free cell reads as [`FREE_CELL`].
    pub fn at(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    /// Whether (row, col) is the free center cell.
    pub fn is_free(row: usize, col: usize) -> bool {
        row == CENTER && col == CENTER
    }

    /// Whether `number` appears on this card.
    pub fn contains(&self, number: u8) -> bool {
        if number == FREE_CELL {
            return false;
        }
        // The column ranges pin which column a number can live in.
        let col = ((number - 1) / COLUMN_SPAN) as usize;
        if col >= GRID_SIZE {
            return false;
        }
        (0..GRID_SIZE).any(|row| self.cells[row][col] == number)
    }

    /// Iterates the 24 real numbers on the card.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells
            .iter()
            .flatten()
            .copied()
            .filter(|&n| n != FREE_CELL)
    }
}

// ---------------------------------------------------------------------------
// CardRegistry
// ---------------------------------------------------------------------------

/// Ownership bookkeeping for one room's card pool.
///
/// Invariants: a card has at most one owner, a player holds at most one
/// card. Lives inside the room actor, so no locking here; mutual
/// exclusion comes from the actor's command serialization.
#[derive(Debug)]
pub struct CardRegistry {
    pool: u16,
    grids: HashMap<CardId, CardGrid>,
    owners: HashMap<CardId, PlayerId>,
    by_player: HashMap<PlayerId, CardId>,
}

impl CardRegistry {
    /// Creates a registry for card ids `1..=pool`.
    pub fn new(pool: u16) -> Self {
        Self {
            pool,
            grids: HashMap::new(),
            owners: HashMap::new(),
            by_player: HashMap::new(),
        }
    }

    /// Assigns `card` to `player`, generating its grid on first claim.
    ///
    /// # Errors
    /// - [`RoomError::UnknownCard`]: id outside `1..=pool`
    /// - [`RoomError::CardUnavailable`]: already owned
    /// - [`RoomError::AlreadySelected`]: player holds another card
    pub fn assign(&mut self, card: CardId, player: PlayerId) -> Result<CardGrid, RoomError> {
        if card.0 == 0 || card.0 > self.pool {
            return Err(RoomError::UnknownCard(card));
        }
        if self.owners.contains_key(&card) {
            return Err(RoomError::CardUnavailable(card));
        }
        if self.by_player.contains_key(&player) {
            return Err(RoomError::AlreadySelected(player));
        }

        let grid = *self
            .grids
            .entry(card)
            .or_insert_with(|| CardGrid::generate(&mut rand::rng()));
        self.owners.insert(card, player);
        self.by_player.insert(player, card);
        Ok(grid)
    }

    /// Clears the card's owner. Idempotent; returns the previous owner.
    /// The grid stays cached, so a re-claimed slot shows the same card.
    pub fn release(&mut self, card: CardId) -> Option<PlayerId> {
        let owner = self.owners.remove(&card)?;
        self.by_player.remove(&owner);
        Some(owner)
    }

    /// Releases whatever card the player holds, if any.
    pub fn release_card_of(&mut self, player: PlayerId) -> Option<CardId> {
        let card = self.by_player.remove(&player)?;
        self.owners.remove(&card);
        Some(card)
    }

    /// Who owns `card`, if anyone.
    pub fn owner_of(&self, card: CardId) -> Option<PlayerId> {
        self.owners.get(&card).copied()
    }

    /// Which card `player` holds, if any.
    pub fn card_of(&self, player: PlayerId) -> Option<CardId> {
        self.by_player.get(&player).copied()
    }

    /// The grid behind `card`, if it has ever been claimed.
    pub fn grid_of(&self, card: CardId) -> Option<&CardGrid> {
        self.grids.get(&card)
    }

    /// How many cards currently have an owner.
    pub fn owned_count(&self) -> usize {
        self.owners.len()
    }

    /// Snapshot of current ownership, sorted by card id for stable
    /// wire output.
    pub fn selections(&self) -> Vec<SelectedCard> {
        let mut out: Vec<SelectedCard> = self
            .owners
            .iter()
            .map(|(&card_id, &player_id)| SelectedCard { card_id, player_id })
            .collect();
        out.sort_by_key(|s| s.card_id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn cid(id: u16) -> CardId {
        CardId(id)
    }

    // ---------------------------------------------------------------
    // Grid generation
    // ---------------------------------------------------------------

    #[test]
    fn test_grid_columns_honor_ranges() {
        let grid = CardGrid::generate(&mut rand::rng());
        for col in 0..GRID_SIZE {
            let low = 15 * col as u8 + 1;
            let high = low + 14;
            for row in 0..GRID_SIZE {
                if CardGrid::is_free(row, col) {
                    continue;
                }
                let n = grid.at(row, col);
                assert!(
                    (low..=high).contains(&n),
                    "cell ({row},{col}) = {n} outside {low}..={high}"
                );
            }
        }
    }

    #[test]
    fn test_grid_has_no_duplicate_numbers() {
        let grid = CardGrid::generate(&mut rand::rng());
        let numbers: Vec<u8> = grid.numbers().collect();
        let mut deduped = numbers.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(numbers.len(), 24);
        assert_eq!(deduped.len(), 24);
    }

    #[test]
    fn test_grid_center_is_free() {
        let grid = CardGrid::generate(&mut rand::rng());
        assert_eq!(grid.at(2, 2), FREE_CELL);
        assert!(CardGrid::is_free(2, 2));
        assert!(!CardGrid::is_free(0, 0));
    }

    #[test]
    fn test_grid_contains() {
        let grid = CardGrid::generate(&mut rand::rng());
        for n in grid.numbers() {
            assert!(grid.contains(n));
        }
        assert!(!grid.contains(FREE_CELL));
        // A full column range has 15 numbers, a column only 5 (4 for N),
        // so some number of every range is absent.
        let absent = (1..=75).find(|n| !grid.contains(*n));
        assert!(absent.is_some());
    }

    // ---------------------------------------------------------------
    // Registry ownership
    // ---------------------------------------------------------------

    #[test]
    fn test_assign_then_lookup() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(3), pid(1)).unwrap();
        assert_eq!(reg.owner_of(cid(3)), Some(pid(1)));
        assert_eq!(reg.card_of(pid(1)), Some(cid(3)));
        assert_eq!(reg.owned_count(), 1);
    }

    #[test]
    fn test_assign_taken_card_fails() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(3), pid(1)).unwrap();
        let err = reg.assign(cid(3), pid(2)).unwrap_err();
        assert!(matches!(err, RoomError::CardUnavailable(c) if c == cid(3)));
        // Ownership unchanged.
        assert_eq!(reg.owner_of(cid(3)), Some(pid(1)));
    }

    #[test]
    fn test_one_card_per_player() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(3), pid(1)).unwrap();
        let err = reg.assign(cid(4), pid(1)).unwrap_err();
        assert!(matches!(err, RoomError::AlreadySelected(p) if p == pid(1)));
    }

    #[test]
    fn test_assign_out_of_pool_fails() {
        let mut reg = CardRegistry::new(10);
        assert!(matches!(
            reg.assign(cid(0), pid(1)),
            Err(RoomError::UnknownCard(_))
        ));
        assert!(matches!(
            reg.assign(cid(11), pid(1)),
            Err(RoomError::UnknownCard(_))
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(3), pid(1)).unwrap();
        assert_eq!(reg.release(cid(3)), Some(pid(1)));
        assert_eq!(reg.release(cid(3)), None);
        assert_eq!(reg.owned_count(), 0);
    }

    #[test]
    fn test_released_card_can_be_reclaimed_with_same_grid() {
        let mut reg = CardRegistry::new(10);
        let first = reg.assign(cid(3), pid(1)).unwrap();
        reg.release(cid(3));
        let second = reg.assign(cid(3), pid(2)).unwrap();
        assert_eq!(first, second, "grid must survive a release");
    }

    #[test]
    fn test_release_card_of_player() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(7), pid(1)).unwrap();
        assert_eq!(reg.release_card_of(pid(1)), Some(cid(7)));
        assert_eq!(reg.release_card_of(pid(1)), None);
        assert_eq!(reg.owner_of(cid(7)), None);
    }

    #[test]
    fn test_selections_sorted_by_card() {
        let mut reg = CardRegistry::new(10);
        reg.assign(cid(9), pid(1)).unwrap();
        reg.assign(cid(2), pid(2)).unwrap();
        let sel = reg.selections();
        assert_eq!(sel.len(), 2);
        assert_eq!(sel[0].card_id, cid(2));
        assert_eq!(sel[1].card_id, cid(9));
    }
}
