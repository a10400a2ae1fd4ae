use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Casual,
    Formal,
    Esportivo,
    Praia,
    Inverno,
    Festa,
}

impl Category {
    pub const ALL: [Category; 6] =
        [Self::Casual, Self::Formal, Self::Esportivo, Self::Praia, Self::Inverno, Self::Festa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Formal => "Formal",
            Self::Esportivo => "Esportivo",
            Self::Praia => "Praia",
            Self::Inverno => "Inverno",
            Self::Festa => "Festa",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == value.trim())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Camiseta,
    #[serde(rename = "Calça")]
    Calca,
    Vestido,
    Saia,
    Blusa,
    Jaqueta,
    Shorts,
    Casaco,
    Sapato,
    #[serde(rename = "Acessório")]
    Acessorio,
}

impl PieceType {
    pub const ALL: [PieceType; 10] = [
        Self::Camiseta,
        Self::Calca,
        Self::Vestido,
        Self::Saia,
        Self::Blusa,
        Self::Jaqueta,
        Self::Shorts,
        Self::Casaco,
        Self::Sapato,
        Self::Acessorio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camiseta => "Camiseta",
            Self::Calca => "Calça",
            Self::Vestido => "Vestido",
            Self::Saia => "Saia",
            Self::Blusa => "Blusa",
            Self::Jaqueta => "Jaqueta",
            Self::Shorts => "Shorts",
            Self::Casaco => "Casaco",
            Self::Sapato => "Sapato",
            Self::Acessorio => "Acessório",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|piece_type| piece_type.as_str() == value.trim())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Preto,
    Branco,
    Azul,
    Vermelho,
    Verde,
    Amarelo,
    Rosa,
    Roxo,
    Marrom,
    Cinza,
    Bege,
    Laranja,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Self::Preto,
        Self::Branco,
        Self::Azul,
        Self::Vermelho,
        Self::Verde,
        Self::Amarelo,
        Self::Rosa,
        Self::Roxo,
        Self::Marrom,
        Self::Cinza,
        Self::Bege,
        Self::Laranja,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preto => "Preto",
            Self::Branco => "Branco",
            Self::Azul => "Azul",
            Self::Vermelho => "Vermelho",
            Self::Verde => "Verde",
            Self::Amarelo => "Amarelo",
            Self::Rosa => "Rosa",
            Self::Roxo => "Roxo",
            Self::Marrom => "Marrom",
            Self::Cinza => "Cinza",
            Self::Bege => "Bege",
            Self::Laranja => "Laranja",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.as_str() == value.trim())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "PP")]
    Pp,
    P,
    M,
    G,
    #[serde(rename = "GG")]
    Gg,
    #[serde(rename = "XGG")]
    Xgg,
    #[serde(rename = "34")]
    Eu34,
    #[serde(rename = "36")]
    Eu36,
    #[serde(rename = "38")]
    Eu38,
    #[serde(rename = "40")]
    Eu40,
    #[serde(rename = "42")]
    Eu42,
    #[serde(rename = "44")]
    Eu44,
    #[serde(rename = "46")]
    Eu46,
    #[serde(rename = "48")]
    Eu48,
}

impl Size {
    pub const ALL: [Size; 14] = [
        Self::Pp,
        Self::P,
        Self::M,
        Self::G,
        Self::Gg,
        Self::Xgg,
        Self::Eu34,
        Self::Eu36,
        Self::Eu38,
        Self::Eu40,
        Self::Eu42,
        Self::Eu44,
        Self::Eu46,
        Self::Eu48,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pp => "PP",
            Self::P => "P",
            Self::M => "M",
            Self::G => "G",
            Self::Gg => "GG",
            Self::Xgg => "XGG",
            Self::Eu34 => "34",
            Self::Eu36 => "36",
            Self::Eu38 => "38",
            Self::Eu40 => "40",
            Self::Eu42 => "42",
            Self::Eu44 => "44",
            Self::Eu46 => "46",
            Self::Eu48 => "48",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.as_str() == value.trim())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub piece_type: PieceType,
    pub color: Color,
    pub size: Size,
    pub price: Decimal,
    pub stock_quantity: u32,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Color, PieceType, Size};

    #[test]
    fn enum_labels_round_trip_through_parse() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        for piece_type in PieceType::ALL {
            assert_eq!(PieceType::parse(piece_type.as_str()), Some(piece_type));
        }
        for color in Color::ALL {
            assert_eq!(Color::parse(color.as_str()), Some(color));
        }
        for size in Size::ALL {
            assert_eq!(Size::parse(size.as_str()), Some(size));
        }
    }

    #[test]
    fn accented_labels_serialize_verbatim() {
        assert_eq!(serde_json::to_string(&PieceType::Calca).expect("serialize"), "\"Calça\"");
        assert_eq!(
            serde_json::to_string(&PieceType::Acessorio).expect("serialize"),
            "\"Acessório\""
        );
        assert_eq!(serde_json::to_string(&Size::Eu42).expect("serialize"), "\"42\"");
        assert_eq!(PieceType::parse("Calca"), None);
    }
}
