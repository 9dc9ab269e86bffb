//! Built-in quest challenge bank.
//!
//! Ten scripted math challenges forming the "Realm of Numbers" quest
//! line. Compiled into the client so the quest works offline; ids are
//! stable because saved snapshots reference them.

use crate::domain::{Challenge, ExpectedAnswer};

fn s(v: &str) -> String {
    v.to_string()
}

fn strs(v: &[&str]) -> Vec<String> {
    v.iter().map(|x| x.to_string()).collect()
}

fn number(value: f64, tolerance: f64) -> ExpectedAnswer {
    ExpectedAnswer::Number { value, tolerance }
}

pub fn quest_challenges() -> Vec<Challenge> {
    vec![
        Challenge {
            id: s("twin-towns"),
            title: s("The Journey Begins: Twin Towns"),
            story: s("Welcome to the Realm of Numbers, brave adventurer!\n\
                Two ancient towns lie hidden in this mathematical realm.\n\
                Town of Mystral sits at (2, 5); Town of Zenith rests at (8, 1).\n\
                Estimate how far apart they are by counting grid squares."),
            question: s("How many units apart are the Twin Towns? (Count grid squares like walking on city blocks)"),
            expected: number(10.0, 1.0),
            hints: strs(&[
                "Think Manhattan distance: |x2-x1| + |y2-y1|",
                "From (2,5) to (8,1): how far East plus how far South?",
                "East: 8-2 = 6 units, South: 5-1 = 4 units, total 6+4 = 10",
            ]),
            explanation: Some(s(
                "The Manhattan distance between (2,5) and (8,1) is |8-2| + |5-1| = 6 + 4 = 10 units, like walking on city blocks.",
            )),
            xp: 50,
            badges: strs(&["Explorer"]),
        },
        Challenge {
            id: s("vector-duel"),
            title: s("Vector Duel: Angle of Warriors"),
            story: s("Two magical warriors challenge you to a duel of angles!\n\
                Warrior Crimson wields the force vector u = (3, -2).\n\
                Warrior Azure commands the vector v = (-1, 5).\n\
                Find the angle between their powers: cos(theta) = (u . v) / (|u| * |v|)"),
            question: s("What is the angle between the warrior vectors (in degrees)?"),
            expected: number(135.0, 1.0),
            hints: strs(&[
                "First calculate the dot product: u.v = (3)(-1) + (-2)(5) = -3 - 10 = -13",
                "Then find magnitudes: |u| = sqrt(13) ~ 3.606, |v| = sqrt(26) ~ 5.099",
                "cos(theta) = -13 / sqrt(338) ~ -0.707, theta = arccos(-0.707) ~ 135 degrees",
            ]),
            explanation: Some(s(
                "The dot product is -13, magnitudes are sqrt(13) and sqrt(26), so cos(theta) ~ -0.707, giving theta ~ 135 degrees.",
            )),
            xp: 75,
            badges: strs(&["Vector Warrior", "Angle Master"]),
        },
        Challenge {
            id: s("magic-bridge"),
            title: s("The Magic Bridge: Perpendicular Bisector"),
            story: s("Ancient stones block your path; only the perfect bridge can unite them!\n\
                Stone of Light at (0, 6), Stone of Shadow at (6, 0).\n\
                The bridge must be the perpendicular bisector, equidistant from both stones.\n\
                Find the slope of this mystical bridge."),
            question: s("What is the slope of the perpendicular bisector between (0,6) and (6,0)?"),
            expected: number(1.0, 0.1),
            hints: strs(&[
                "First find the slope of the line connecting the stones: (0-6)/(6-0) = -1",
                "Perpendicular lines have slopes that multiply to -1",
                "If the original slope is -1, the perpendicular slope is -1/(-1) = 1",
            ]),
            explanation: Some(s(
                "The connecting line has slope -1, so the perpendicular bisector has slope 1 (negative reciprocal).",
            )),
            xp: 100,
            badges: strs(&["Bridge Builder", "Balance Master"]),
        },
        Challenge {
            id: s("roads-waypoints"),
            title: s("Roads & Waypoints: Linear Paths"),
            story: s("Ancient roads crisscross the realm; master their secrets!\n\
                The Royal Road follows y = 3x; the Merchant's Path follows y = 2x + 3.\n\
                Find where the Royal Road crosses the East-West border (y = 0)."),
            question: s("At what x-coordinate does the Royal Road (y = 3x) cross the x-axis (y = 0)?"),
            expected: number(0.0, 0.1),
            hints: strs(&[
                "Set y = 0 in the equation y = 3x",
                "0 = 3x means x must equal 0",
                "The Royal Road passes through the origin (0,0)",
            ]),
            explanation: Some(s(
                "When y = 0, we get 0 = 3x, so x = 0. The Royal Road crosses the x-axis at (0,0).",
            )),
            xp: 125,
            badges: strs(&["Pathfinder", "Navigator"]),
        },
        Challenge {
            id: s("valley-curves"),
            title: s("Valley of Curves: The Quadratic Quest"),
            story: s("A mystical parabola guards the valley; find its secrets!\n\
                The curve's equation: f(x) = x^2 - 4x + 3.\n\
                The vertex is the lowest point of this upward-opening parabola."),
            question: s("What is the x-coordinate of the vertex of f(x) = x^2 - 4x + 3?"),
            expected: number(2.0, 0.1),
            hints: strs(&[
                "For f(x) = ax^2 + bx + c, the vertex x-coordinate is -b/(2a)",
                "Here a = 1, b = -4, so x = -(-4)/(2*1) = 4/2 = 2",
                "The vertex sits on the axis of symmetry of the parabola",
            ]),
            explanation: Some(s(
                "Using the vertex formula x = -b/(2a) with a = 1, b = -4: x = -(-4)/(2*1) = 2.",
            )),
            xp: 150,
            badges: strs(&["Valley Master", "Vertex Finder"]),
        },
        Challenge {
            id: s("duel-of-lines"),
            title: s("Duel of Lines: Angle Warriors"),
            story: s("Two line warriors meet in epic combat; find the angle between them!\n\
                Warrior Crimson: y = 2x + 3. Warrior Azure: y = -3x + 2.\n\
                Use the formula: tan(theta) = |(m1 - m2) / (1 + m1*m2)|"),
            question: s("What is the acute angle between y = 2x + 3 and y = -3x + 2 (in degrees)?"),
            expected: number(45.0, 1.0),
            hints: strs(&[
                "Slopes are m1 = 2 and m2 = -3",
                "tan(theta) = |2 - (-3)| / |1 + (2)(-3)| = 5/|-5| = 1",
                "If tan(theta) = 1, then theta = arctan(1) = 45 degrees",
            ]),
            explanation: Some(s(
                "Using the angle formula: tan(theta) = |2-(-3)|/|1+(2)(-3)| = 5/5 = 1, so theta = 45 degrees.",
            )),
            xp: 175,
            badges: strs(&["Angle Warrior", "Battle Master"]),
        },
        Challenge {
            id: s("tower-watch"),
            title: s("Tower Watch: Angle of Depression"),
            story: s("From the ancient watchtower, calculate the angle of depression!\n\
                You stand 30 meters above the realm; a mysterious object lies\n\
                50 meters away on the ground. Find the angle you must look down."),
            question: s("What is the angle of depression from 30m high tower to object 50m away (in degrees)?"),
            expected: number(31.0, 1.0),
            hints: strs(&[
                "This is a right triangle: opposite = 30m (height), adjacent = 50m (distance)",
                "Use tan(theta) = opposite/adjacent = 30/50 = 0.6",
                "theta = arctan(0.6) ~ 31 degrees",
            ]),
            explanation: Some(s(
                "tan(theta) = height/distance = 30/50 = 0.6, so theta = arctan(0.6) ~ 31 degrees.",
            )),
            xp: 200,
            badges: strs(&["Tower Guardian", "Angle Scout"]),
        },
        Challenge {
            id: s("triangle-forge"),
            title: s("Triangle Forge: Sacred Geometry"),
            story: s("The ancient forge awaits: craft the legendary 3-4-5 triangle!\n\
                Vertices at Origin (0,0), Point Alpha (3,0), Point Beta (0,4).\n\
                Find the x-coordinate of the centroid, the center of balance."),
            question: s("What is the x-coordinate of the centroid of triangle with vertices (0,0), (3,0), (0,4)?"),
            expected: number(1.0, 0.1),
            hints: strs(&[
                "Centroid x-coordinate = (x1 + x2 + x3) / 3",
                "With vertices (0,0), (3,0), (0,4): x-coordinate = (0 + 3 + 0) / 3",
                "Centroid x = 3/3 = 1",
            ]),
            explanation: Some(s("Centroid x-coordinate = (0 + 3 + 0)/3 = 3/3 = 1.")),
            xp: 225,
            badges: strs(&["Forge Master", "Sacred Geometry"]),
        },
        Challenge {
            id: s("circle-rune"),
            title: s("Circle Rune: The Parametric Portal"),
            story: s("Trace the ancient unit circle using parametric magic!\n\
                The Unit Circle of radius 1 is centered at the origin, with\n\
                parametric equations x = cos(t), y = sin(t).\n\
                At what value of t does the point reach (0, 1)?"),
            question: s("At what value of t (in degrees) does (cos(t), sin(t)) = (0, 1)?"),
            expected: number(90.0, 1.0),
            hints: strs(&[
                "We need cos(t) = 0 and sin(t) = 1",
                "cos(90) = 0 and sin(90) = 1",
                "This is the North point on the unit circle",
            ]),
            explanation: Some(s(
                "At t = 90 degrees, cos(t) = 0 and sin(t) = 1, giving the point (0, 1).",
            )),
            xp: 250,
            badges: strs(&["Circle Master", "Parametric Sage"]),
        },
        Challenge {
            id: s("portals-planes"),
            title: s("Portals of Planes: The 3D Finale"),
            story: s("Enter the realm of 3D space where mystical planes intersect!\n\
                Portal Alpha: 2x - 3y + z = 6. Portal Beta: x + 4y - 2z = 8.\n\
                The angle between planes equals the angle between their normal vectors."),
            question: s("What is the angle between planes 2x-3y+z=6 and x+4y-2z=8 (in degrees)?"),
            expected: number(73.0, 2.0),
            hints: strs(&[
                "Normal vectors: n1 = (2,-3,1) and n2 = (1,4,-2)",
                "Dot product: n1.n2 = (2)(1) + (-3)(4) + (1)(-2) = 2 - 12 - 2 = -12",
                "Magnitudes: |n1| = sqrt(14), |n2| = sqrt(21)",
                "cos(theta) = |n1.n2|/(|n1||n2|) = 12/(sqrt(14)*sqrt(21)) ~ 0.70, theta ~ 73 degrees",
            ]),
            explanation: Some(s(
                "Using normal vectors (2,-3,1) and (1,4,-2): cos(theta) = |dot product|/(product of magnitudes) ~ 0.70, giving theta ~ 73 degrees.",
            )),
            xp: 300,
            badges: strs(&["Dimension Master", "3D Sage", "Mathematical Champion"]),
        },
    ]
}
