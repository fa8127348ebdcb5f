//! Built-in demo network used when no scenario file is given

use anyhow::{Context, Result};

use super::scenario::Scenario;

/// Two opposing lines through station C, which closes at tick 3 and reopens
/// at tick 6, plus a short branch.
///
/// ```text
/// R1: A -> B -> C -> D
/// R2: D -> C -> B -> A
/// R3: B -> E
/// ```
pub const DEMO_SCENARIO: &str = "\
# Network
Stations: 5
A
B
C
D
E
Segments: 7
S1:A:B
S2:B:C
S3:C:D
S4:D:C
S5:C:B
S6:B:A
S7:B:E
Routes: 3
R1:false:S1;S2;S3
R2:false:S4;S5;S6
R3:false:S7
Trains: 4
T1:0:R1:all
T2:2:R1:all
T3:0:R2:all
T4:1:R3:all

1
Trains: 4
T1:0:R1:B;C
T2:2:R1:all
T3:0:R2:all
T4:1:R3:all

3
Events: 1
Close:Station:C

6
Events: 1
Open:Station:C
";

pub fn demo_scenario() -> Result<Scenario> {
    Scenario::parse(DEMO_SCENARIO).context("parsing the built-in demo scenario")
}
