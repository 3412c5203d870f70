//! Corridors board: positions, walls, move generation, and evaluation.
//!
//! Every `Board` value is expressed from the perspective of the side to
//! move: "hero" sits low on the board racing toward the top row, "villain"
//! high racing toward the bottom row. Making a move produces the successor
//! position *flipped*, so the next mover is hero again. All equities follow
//! this rotating frame.

use crate::bitset::WallSet;

/// Board width and height in squares.
pub const BOARD_SIZE: usize = 9;

/// Walls each player starts with.
pub const STARTING_WALLS: u16 = 10;

/// Wall-middle intersections (anchors), an 8x8 grid.
pub(crate) const MIDDLES: usize = (BOARD_SIZE - 1) * (BOARD_SIZE - 1);

/// Wall segments per orientation.
pub(crate) const SEGMENTS: usize = (BOARD_SIZE - 1) * BOARD_SIZE;

const CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// Pairs of (dx, dy): down, left, right, up. Down first: flood fills race
/// toward row zero, so downward expansion tends to finish earliest.
const DIRECTIONS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// The move that produced a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pawn step onto the named square.
    Pawn { x: u16, y: u16 },
    /// Wall anchored at the named middle intersection.
    Wall { vertical: bool, x: u16, y: u16 },
}

impl Action {
    /// The same action from the opposite perspective.
    pub fn flipped(self) -> Self {
        match self {
            Action::Pawn { x, y } => Action::Pawn {
                x: (BOARD_SIZE - 1) as u16 - x,
                y: (BOARD_SIZE - 1) as u16 - y,
            },
            Action::Wall { vertical, x, y } => Action::Wall {
                vertical,
                x: (BOARD_SIZE - 2) as u16 - x,
                y: (BOARD_SIZE - 2) as u16 - y,
            },
        }
    }

    /// Canonical text: `*(x,y)` for pawn steps, `H(x,y)` / `V(x,y)` for
    /// walls.
    pub fn text(self) -> String {
        match self {
            Action::Pawn { x, y } => format!("*({x},{y})"),
            Action::Wall { vertical, x, y } => {
                format!("{}({x},{y})", if vertical { "V" } else { "H" })
            }
        }
    }
}

/// A Corridors position from the side-to-move's perspective.
#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) hero_x: u16,
    pub(crate) hero_y: u16,
    pub(crate) villain_x: u16,
    pub(crate) villain_y: u16,
    pub(crate) hero_walls_remaining: u16,
    pub(crate) villain_walls_remaining: u16,
    // Wall indices start in the lower-left corner from hero's perspective
    // and move right, then up one row and right again.
    pub(crate) wall_middles: WallSet<MIDDLES>,
    pub(crate) horizontal_walls: WallSet<SEGMENTS>,
    pub(crate) vertical_walls: WallSet<SEGMENTS>,
    pub(crate) last_action: Option<Action>,
}

impl Default for Board {
    /// The starting position: both pawns on their home rows, full wall
    /// stocks, no walls placed.
    fn default() -> Self {
        Self {
            hero_x: (BOARD_SIZE / 2) as u16,
            hero_y: 0,
            villain_x: (BOARD_SIZE / 2) as u16,
            villain_y: (BOARD_SIZE - 1) as u16,
            hero_walls_remaining: STARTING_WALLS,
            villain_walls_remaining: STARTING_WALLS,
            wall_middles: WallSet::new(),
            horizontal_walls: WallSet::new(),
            vertical_walls: WallSet::new(),
            last_action: None,
        }
    }
}

// The producing action is presentation metadata, not position identity.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.hero_x == other.hero_x
            && self.hero_y == other.hero_y
            && self.villain_x == other.villain_x
            && self.villain_y == other.villain_y
            && self.hero_walls_remaining == other.hero_walls_remaining
            && self.villain_walls_remaining == other.villain_walls_remaining
            && self.wall_middles == other.wall_middles
            && self.horizontal_walls == other.horizontal_walls
            && self.vertical_walls == other.vertical_walls
    }
}

impl Eq for Board {}

impl Board {
    /// Hero's (x, y) square.
    pub fn hero(&self) -> (u16, u16) {
        (self.hero_x, self.hero_y)
    }

    /// Villain's (x, y) square.
    pub fn villain(&self) -> (u16, u16) {
        (self.villain_x, self.villain_y)
    }

    /// Walls remaining as (hero, villain).
    pub fn walls_remaining(&self) -> (u16, u16) {
        (self.hero_walls_remaining, self.villain_walls_remaining)
    }

    /// The move that produced this position, if any.
    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn hero_wins(&self) -> bool {
        self.hero_y == (BOARD_SIZE - 1) as u16
    }

    pub fn villain_wins(&self) -> bool {
        self.villain_y == 0
    }

    pub fn is_terminal(&self) -> bool {
        self.hero_wins() || self.villain_wins()
    }

    /// Terminal value from hero's perspective. Only meaningful on terminal
    /// positions.
    pub fn terminal_eval(&self) -> f64 {
        debug_assert!(self.is_terminal());
        if self.hero_wins() {
            1.0
        } else {
            -1.0
        }
    }

    /// The same position from villain's perspective: pawns swapped, every
    /// coordinate rotated half a turn, wall stocks exchanged.
    pub fn flipped(&self) -> Self {
        let top = (BOARD_SIZE - 1) as u16;
        Self {
            hero_x: top - self.villain_x,
            hero_y: top - self.villain_y,
            villain_x: top - self.hero_x,
            villain_y: top - self.hero_y,
            hero_walls_remaining: self.villain_walls_remaining,
            villain_walls_remaining: self.hero_walls_remaining,
            wall_middles: self.wall_middles.flipped(),
            horizontal_walls: self.horizontal_walls.flipped(),
            vertical_walls: self.vertical_walls.flipped(),
            last_action: self.last_action.map(Action::flipped),
        }
    }

    /// Text of the producing move; `flip` reports it from the opposite
    /// perspective, which is usually the perspective of the player who made
    /// it.
    pub fn action_text(&self, flip: bool) -> String {
        match self.last_action {
            Some(action) => (if flip { action.flipped() } else { action }).text(),
            None => "-".into(),
        }
    }

    /// Whether a single step from (x, y) by (dx, dy) stays on the board and
    /// crosses no wall segment. Pawn occupancy is not considered here.
    fn step_allowed(&self, x: usize, y: usize, dx: isize, dy: isize) -> bool {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= BOARD_SIZE as isize || ny >= BOARD_SIZE as isize {
            return false;
        }

        if dx != 0 {
            // horizontal step: the vertical segment to hero's right is
            // indexed x * BOARD_SIZE + y; a leftward step checks the column
            // one to the left
            let mut segment = BOARD_SIZE * x + y;
            if dx < 0 {
                segment -= BOARD_SIZE;
            }
            !self.vertical_walls.test(segment)
        } else {
            let mut segment = BOARD_SIZE * y + x;
            if dy < 0 {
                segment -= BOARD_SIZE;
            }
            !self.horizontal_walls.test(segment)
        }
    }

    /// Whether an unobstructed path still connects villain's pawn to their
    /// goal row. Wall placements that would seal either player in are
    /// illegal, and move generation checks this on both orientations.
    pub(crate) fn villain_is_escapable(&self) -> bool {
        let (start_x, start_y) = (self.villain_x as usize, self.villain_y as usize);
        if start_y == 0 {
            return true;
        }

        let mut visited = [false; CELLS];
        visited[start_y * BOARD_SIZE + start_x] = true;
        let mut stack = vec![(start_x, start_y)];
        while let Some((x, y)) = stack.pop() {
            if y == 0 {
                return true;
            }
            for (dx, dy) in DIRECTIONS {
                if !self.step_allowed(x, y, dx, dy) {
                    continue;
                }
                let nx = (x as isize + dx) as usize;
                let ny = (y as isize + dy) as usize;
                let index = ny * BOARD_SIZE + nx;
                if !visited[index] {
                    visited[index] = true;
                    stack.push((nx, ny));
                }
            }
        }
        false
    }

    /// Minimum number of moves villain needs to reach their goal row,
    /// ignoring pawn occupancy. Breadth-first frontier expansion from
    /// villain's square.
    pub fn villain_distance(&self) -> u16 {
        let mut shortest = [u16::MAX; CELLS];
        shortest[self.villain_y as usize * BOARD_SIZE + self.villain_x as usize] = 0;

        let mut frontier = vec![(self.villain_x as usize, self.villain_y as usize)];
        let mut cumulative: u16 = 1;
        while !frontier.is_empty() {
            let mut next_frontier = Vec::new();
            for (x, y) in frontier {
                for (dx, dy) in DIRECTIONS {
                    if !self.step_allowed(x, y, dx, dy) {
                        continue;
                    }
                    let nx = (x as isize + dx) as usize;
                    let ny = (y as isize + dy) as usize;
                    let index = ny * BOARD_SIZE + nx;
                    if shortest[index] > cumulative {
                        shortest[index] = cumulative;
                        next_frontier.push((nx, ny));
                    }
                }
            }
            frontier = next_frontier;
            cumulative = cumulative.saturating_add(1);
        }

        // villain's goal is the first row
        let mut best = u16::MAX;
        for &distance in shortest.iter().take(BOARD_SIZE) {
            best = best.min(distance);
        }
        best
    }

    /// Minimum number of moves hero needs to reach their goal row.
    pub fn hero_distance(&self) -> u16 {
        self.flipped().villain_distance()
    }

    /// Net racing margin from villain's perspective: positive means villain
    /// is closer to home.
    pub fn non_terminal_rank(&self) -> i32 {
        self.hero_distance() as i32 - self.villain_distance() as i32
    }

    /// Exact evaluation once the game is a pure race: with no walls left on
    /// either side the shortest paths decide it. A margin of two moves is
    /// required so that hopping and move order cannot change the outcome.
    pub fn non_terminal_eval(&self) -> Option<f64> {
        if self.is_terminal() {
            return None;
        }
        if self.hero_walls_remaining > 0 || self.villain_walls_remaining > 0 {
            return None;
        }

        let rank = self.non_terminal_rank();
        if rank <= -2 {
            Some(1.0)
        } else if rank >= 2 {
            Some(-1.0)
        } else {
            None
        }
    }

    /// Append every legal successor to `out`: pawn steps (with hopping),
    /// then wall placements in anchor order, horizontal before vertical.
    /// Successors are flip-constructed so the next mover is hero again.
    pub fn legal_moves(&self, out: &mut Vec<Board>) {
        if self.is_terminal() {
            return;
        }

        self.collect_pawn_move(0, 1, out);
        self.collect_pawn_move(1, 0, out);
        self.collect_pawn_move(-1, 0, out);
        self.collect_pawn_move(0, -1, out);

        if self.hero_walls_remaining == 0 {
            return;
        }

        for middle in 0..MIDDLES {
            if self.wall_middles.test(middle) {
                continue;
            }
            let x = middle % (BOARD_SIZE - 1);
            let y = middle / (BOARD_SIZE - 1);

            let horizontal = y * BOARD_SIZE + x;
            if !self.horizontal_walls.test(horizontal)
                && !self.horizontal_walls.test(horizontal + 1)
            {
                let mut proposed = self.clone();
                proposed.wall_middles.set(middle);
                proposed.horizontal_walls.set(horizontal);
                proposed.horizontal_walls.set(horizontal + 1);
                proposed.hero_walls_remaining -= 1;
                proposed.last_action = Some(Action::Wall {
                    vertical: false,
                    x: x as u16,
                    y: y as u16,
                });
                push_if_escapable(proposed, out);
            }

            let vertical = x * BOARD_SIZE + y;
            if !self.vertical_walls.test(vertical) && !self.vertical_walls.test(vertical + 1) {
                let mut proposed = self.clone();
                proposed.wall_middles.set(middle);
                proposed.vertical_walls.set(vertical);
                proposed.vertical_walls.set(vertical + 1);
                proposed.hero_walls_remaining -= 1;
                proposed.last_action = Some(Action::Wall {
                    vertical: true,
                    x: x as u16,
                    y: y as u16,
                });
                push_if_escapable(proposed, out);
            }
        }
    }

    /// Try a pawn step by (dx, dy). Landing on villain continues straight
    /// when possible, otherwise branches to the orthogonal hops. Returns
    /// whether at least one move was emitted.
    fn collect_pawn_move(&self, dx: isize, dy: isize, out: &mut Vec<Board>) -> bool {
        if !self.step_allowed(self.hero_x as usize, self.hero_y as usize, dx, dy) {
            return false;
        }

        let mut next = self.clone();
        next.hero_x = (self.hero_x as isize + dx) as u16;
        next.hero_y = (self.hero_y as isize + dy) as u16;
        next.last_action = Some(Action::Pawn {
            x: next.hero_x,
            y: next.hero_y,
        });

        if next.hero_x == next.villain_x && next.hero_y == next.villain_y {
            // hopping: straight through if legal
            if next.collect_pawn_move(dx, dy, out) {
                return true;
            }
            // straight was blocked: branch sideways from villain's square
            if dx != 0 {
                let up = next.collect_pawn_move(0, 1, out);
                let down = next.collect_pawn_move(0, -1, out);
                up || down
            } else {
                let right = next.collect_pawn_move(1, 0, out);
                let left = next.collect_pawn_move(-1, 0, out);
                right || left
            }
        } else {
            out.push(next.flipped());
            true
        }
    }

    /// Heuristic evaluation for search without rollouts: the racing margin
    /// with a small wall-stock term, squashed well inside (-1, +1), plus
    /// uniform priors over the successors.
    pub fn eval(&self, children: &[Board]) -> (f64, Vec<f64>) {
        let rank = self.non_terminal_rank() as f64;
        let wall_edge = self.hero_walls_remaining as f64 - self.villain_walls_remaining as f64;
        let q = (-rank * 0.1 + wall_edge * 0.02).clamp(-0.95, 0.95);
        let probs = if children.is_empty() {
            Vec::new()
        } else {
            vec![1.0 / children.len() as f64; children.len()]
        };
        (q, probs)
    }

    /// ASCII rendering with distance and wall-stock headers. Hero is `h`,
    /// villain `v`; placed walls draw as `-`, `|` and `+` anchors.
    pub fn render(&self) -> String {
        let mut dots = String::from(".");
        let mut blanks = String::from(" ");
        for _ in 0..BOARD_SIZE {
            dots.push_str("   .");
            blanks.push_str("    ");
        }

        let mut rows = vec![dots.clone()];
        for _ in 0..BOARD_SIZE {
            rows.push(blanks.clone());
            rows.push(dots.clone());
        }

        let put = |rows: &mut Vec<String>, x: usize, y: usize, s: &str| {
            rows[y].replace_range(x..x + s.len(), s);
        };

        let hero_col = 2 + self.hero_x as usize * 4;
        let hero_row = 1 + (BOARD_SIZE - 1 - self.hero_y as usize) * 2;
        let villain_col = 2 + self.villain_x as usize * 4;
        let villain_row = 1 + (BOARD_SIZE - 1 - self.villain_y as usize) * 2;
        put(&mut rows, hero_col, hero_row, "h");
        put(&mut rows, villain_col, villain_row, "v");

        for middle in 0..MIDDLES {
            if self.wall_middles.test(middle) {
                let x = 4 + (middle % (BOARD_SIZE - 1)) * 4;
                let y = 2 + (BOARD_SIZE - 2 - middle / (BOARD_SIZE - 1)) * 2;
                put(&mut rows, x, y, "+");
            }
        }

        for segment in 0..SEGMENTS {
            if self.horizontal_walls.test(segment) {
                let x = 1 + (segment % BOARD_SIZE) * 4;
                let y = 2 + (BOARD_SIZE - 2 - segment / BOARD_SIZE) * 2;
                put(&mut rows, x, y, "---");
            }
            if self.vertical_walls.test(segment) {
                let x = 4 + (segment / BOARD_SIZE) * 4;
                let y = 1 + (BOARD_SIZE - 1 - segment % BOARD_SIZE) * 2;
                put(&mut rows, x, y, "|");
            }
        }

        let mut out = format!(
            "Hero distance from end: {}\nVillain distance from end: {}\n",
            self.hero_distance(),
            self.villain_distance()
        );
        out.push_str(&format!(
            "Hero walls remaining: {}\nVillain walls remaining: {}\n",
            self.hero_walls_remaining, self.villain_walls_remaining
        ));
        for row in rows {
            out.push_str(&row);
            out.push('\n');
        }
        out
    }
}

/// Keep a proposed wall placement only if both players can still reach
/// their goal rows, then emit it flip-constructed.
fn push_if_escapable(proposed: Board, out: &mut Vec<Board>) {
    if !proposed.villain_is_escapable() {
        return;
    }
    let flipped = proposed.flipped();
    if flipped.villain_is_escapable() {
        out.push(flipped);
    }
}

impl mcts::GamePosition for Board {
    fn is_terminal(&self) -> bool {
        Board::is_terminal(self)
    }

    fn terminal_eval(&self) -> f64 {
        Board::terminal_eval(self)
    }

    fn non_terminal_eval(&self) -> Option<f64> {
        Board::non_terminal_eval(self)
    }

    fn non_terminal_rank(&self) -> i32 {
        Board::non_terminal_rank(self)
    }

    fn legal_moves(&self, out: &mut Vec<Self>) {
        Board::legal_moves(self, out)
    }

    fn eval(&self, children: &[Self]) -> (f64, Vec<f64>) {
        Board::eval(self, children)
    }

    fn action_text(&self, flip: bool) -> String {
        Board::action_text(self, flip)
    }

    fn flipped(&self) -> Self {
        Board::flipped(self)
    }

    fn render(&self) -> String {
        Board::render(self)
    }
}
