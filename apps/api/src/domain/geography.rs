// Reference data for Mozambique: provinces, their districts, and the
// public-sector areas users can register under.

/// Provinces with the districts that belong to each one.
pub const PROVINCES: &[(&str, &[&str])] = &[
    (
        "Maputo Cidade",
        &["KaMpfumo", "Nlhamankulu", "KaMaxaquene", "KaMavota", "KaTembe"],
    ),
    (
        "Maputo Província",
        &[
            "Boane", "Magude", "Manhiça", "Marracuene", "Matola", "Moamba", "Namaacha",
        ],
    ),
    (
        "Gaza",
        &[
            "Bilene-Macia", "Chibuto", "Chicualacuala", "Chigubo", "Chókwè", "Guijá", "Limpopo",
            "Manjacaze", "Massangena", "Massingir", "Xai-Xai",
        ],
    ),
    (
        "Inhambane",
        &[
            "Funhalouro", "Govuro", "Homoíne", "Inharrime", "Inhassoro", "Jangamo", "Mabote",
            "Massinga", "Maxixe", "Morrumbene", "Panda", "Vilanculos", "Zavala",
        ],
    ),
    (
        "Sofala",
        &[
            "Beira", "Búzi", "Caia", "Chemba", "Cheringoma", "Chibabava", "Dondo", "Gorongosa",
            "Machanga", "Marromeu", "Muanza", "Nhamatanda",
        ],
    ),
    (
        "Manica",
        &[
            "Báruè", "Chimoio", "Gondola", "Guro", "Machaze", "Macossa", "Manica", "Mossurize",
            "Sussundenga", "Tambara", "Vanduzi",
        ],
    ),
    (
        "Tete",
        &[
            "Angónia", "Cahora-Bassa", "Changara", "Chifunde", "Chiuta", "Dôa", "Macanga",
            "Marávia", "Moatize", "Mutarara", "Tete", "Tsangano", "Zumbo",
        ],
    ),
    (
        "Zambézia",
        &[
            "Alto Molócuè", "Chinde", "Derre", "Gile", "Gilé", "Gurué", "Ile", "Inhassunge",
            "Lugela", "Maganja da Costa", "Milange", "Mocuba", "Mocubela", "Molumbo", "Mopeia",
            "Morrumbala", "Namacurra", "Namarrói", "Nicoadala", "Pebane", "Quelimane",
        ],
    ),
    (
        "Nampula",
        &[
            "Angoche", "Eráti", "Ilha de Moçambique", "Lalaua", "Larde", "Liúpo", "Malema",
            "Meconta", "Mecubúri", "Memba", "Mogincual", "Mogovolas", "Moma", "Monapo",
            "Mossuril", "Muecate", "Murrupula", "Nacala-a-Velha", "Nacala Porto", "Nampula",
            "Rapale", "Ribaué",
        ],
    ),
    (
        "Cabo Delgado",
        &[
            "Ancuabe", "Balama", "Chiúre", "Ibo", "Macomia", "Mecúfi", "Meluco",
            "Mocímboa da Praia", "Montepuez", "Mueda", "Muidumbe", "Namuno", "Nangade", "Palma",
            "Pemba", "Quissanga",
        ],
    ),
    (
        "Niassa",
        &[
            "Chimbunila", "Cuamba", "Lago", "Lichinga", "Majune", "Mandimba", "Marrupa", "Maúa",
            "Mavago", "Mecanhelas", "Mecula", "Metarica", "Muembe", "N'gauma", "Nipepe", "Sanga",
        ],
    ),
];

/// Public-sector areas accepted at registration.
pub const SECTORS: &[&str] = &[
    "Educação",
    "Saúde",
    "Administração Pública",
    "Justiça",
    "Segurança Pública",
    "Agricultura",
    "Obras Públicas",
    "Transportes",
    "Finanças",
    "Outros",
];

/// Returns the districts of `province`, or `None` if the province is unknown.
pub fn districts_of(province: &str) -> Option<&'static [&'static str]> {
    PROVINCES
        .iter()
        .find(|(name, _)| *name == province)
        .map(|(_, districts)| *districts)
}

pub fn is_known_province(province: &str) -> bool {
    districts_of(province).is_some()
}

/// True when `district` is listed under `province`.
pub fn district_belongs_to(province: &str, district: &str) -> bool {
    districts_of(province).is_some_and(|districts| districts.contains(&district))
}

pub fn is_known_sector(sector: &str) -> bool {
    SECTORS.contains(&sector)
}
