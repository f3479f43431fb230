use maud::{Markup, html};

pub const CITIES: [&str; 75] = [
    "Azilal", "Beni Mellal", "Fquih Ben Salah", "Khenifra", "Khouribga",
    "Benslimane", "Berrechid", "Casablanca", "El Jadida", "Mediouna",
    "Mohammedia", "Nouaceur", "Settat", "Sidi Bennour", "Errachidia",
    "Midelt", "Ouarzazate", "Tinghir", "Zagora", "Boulemane",
    "El Hajeb", "Fez", "Ifrane", "Meknes", "Moulay Yacoub",
    "Sefrou", "Taounate", "Taza", "Tahannaout", "Chichaoua",
    "Kalaat Sraghna", "Essaouira", "Marrakesh", "Ben Guerir", "Safi",
    "Youssoufia", "Berkane", "Driouch", "Figuig", "Guercif",
    "Jerada", "Nador", "Oujda", "Taourirt", "Kenitra",
    "Khemisset", "Rabat", "Salé", "Sidi Kacem", "Sidi Slimane",
    "Temara", "Agadir", "Biougra", "Inezgane", "Taroudant",
    "Tata", "Tiznit", "Al Hoceima", "Chefchaouen", "Anjra",
    "Larache", "M'diq", "Ouazzane", "Tangier", "Tétouan",
    "Aousserd", "Dakhla", "Assa", "Guelmim", "Sidi Ifni",
    "Tan-Tan", "Boujdour", "Smara", "Laayoune", "Tarfaya",
];

pub fn city_options() -> Markup {
    html! {
        option value="" { "Select" }
        @for city in CITIES {
            option value=(city) { (city) }
        }
    }
}

pub fn city_options_html() -> String {
    city_options().into_string()
}
