// Built-in character pool.

use crate::types::{Character, Rarity};

struct Entry {
    id: &'static str,
    name: &'static str,
    rarity: Rarity,
    serifs: &'static [&'static str],
    description: Option<&'static str>,
}

const ROSTER: &[Entry] = &[
    Entry {
        id: "onakayuru",
        name: "オナカユル",
        rarity: Rarity::Ssr,
        serifs: &["すまん…限界や…"],
        description: Some("排出率は低いが排泄率は高い男"),
    },
    Entry {
        id: "nemui",
        name: "ネムスギル",
        rarity: Rarity::Ssr,
        serifs: &["5分だけ…5分だけ…"],
        description: Some("二度寝の覇王"),
    },
    Entry {
        id: "yarukinai",
        name: "ヤルキナイ",
        rarity: Rarity::Ssr,
        serifs: &["明日から本気出す"],
        description: Some("永遠の明日を生きる者"),
    },
    Entry {
        id: "nemusou",
        name: "ネムソウ",
        rarity: Rarity::Sr,
        serifs: &["ふぁ〜…おはよ…"],
        description: None,
    },
    Entry {
        id: "tsukareta",
        name: "ツカレタ",
        rarity: Rarity::Sr,
        serifs: &["今日もう関節3回鳴った"],
        description: None,
    },
    Entry {
        id: "harahetta",
        name: "ハラヘッタ",
        rarity: Rarity::Sr,
        serifs: &["なんか食べたい…"],
        description: None,
    },
    Entry {
        id: "mendokusai",
        name: "メンドクサイ",
        rarity: Rarity::Sr,
        serifs: &["あー…まあ…うん…"],
        description: None,
    },
    Entry {
        id: "normal",
        name: "フツウノヒト",
        rarity: Rarity::R,
        serifs: &["どうも"],
        description: None,
    },
    Entry {
        id: "salaryman",
        name: "シャカイジン",
        rarity: Rarity::R,
        serifs: &["お疲れ様です"],
        description: None,
    },
    Entry {
        id: "gakusei",
        name: "ガクセイ",
        rarity: Rarity::R,
        serifs: &["レポートやばい"],
        description: None,
    },
    Entry {
        id: "shufuA",
        name: "シュフA",
        rarity: Rarity::R,
        serifs: &["特売日だわ"],
        description: None,
    },
    Entry {
        id: "mob",
        name: "モブ",
        rarity: Rarity::N,
        serifs: &["..."],
        description: None,
    },
    Entry {
        id: "mobA",
        name: "モブA",
        rarity: Rarity::N,
        serifs: &["あ、どうも"],
        description: None,
    },
    Entry {
        id: "mobB",
        name: "モブB",
        rarity: Rarity::N,
        serifs: &["うん"],
        description: None,
    },
    Entry {
        id: "mobC",
        name: "モブC",
        rarity: Rarity::N,
        serifs: &["はい"],
        description: None,
    },
];

/// The default character pool, rarest tier first.
pub fn default_characters() -> Vec<Character> {
    ROSTER
        .iter()
        .map(|e| Character {
            id: e.id.to_string(),
            name: e.name.to_string(),
            rarity: e.rarity,
            serifs: e.serifs.iter().map(|s| s.to_string()).collect(),
            description: e.description.map(str::to_string),
        })
        .collect()
}
