//! # Decodificación de Query Strings y Paths
//! src/http/query.rs
//!
//! Decodificación `application/x-www-form-urlencoded`:
//!
//! - `+` se convierte en espacio
//! - `%XY` se convierte en el byte con valor hexadecimal `XY`
//! - `&` separa parámetros, el primer `=` separa nombre y valor
//!
//! Un `%` que no va seguido de dos dígitos hexadecimales se copia tal cual.
//! Los parámetros conservan el orden en que llegaron.

/// Decodifica percent-encoding (y `+` si `plus_as_space`) sobre bytes crudos
fn percent_decode(input: &[u8], plus_as_space: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match (input.get(i + 1), input.get(i + 2)) {
                (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                    out.push(hex_value(hi) << 4 | hex_value(lo));
                    i += 3;
                }
                _ => {
                    // Escape malformado: se deja literal
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

/// Decodifica un componente de query string (`+` → espacio, `%XY` → byte)
///
/// # Ejemplo
/// ```
/// use mini_httpd::http::query::url_decode;
///
/// assert_eq!(url_decode("two%20words"), "two words");
/// assert_eq!(url_decode("a+b"), "a b");
/// ```
pub fn url_decode(s: &str) -> String {
    String::from_utf8_lossy(&percent_decode(s.as_bytes(), true)).into_owned()
}

/// Decodifica y normaliza el path de un request
///
/// El resultado es relativo a la raíz: sin `/` inicial, sin segmentos `.`,
/// y con los `..` resueltos. Conserva la `/` final si el path la tenía.
///
/// Retorna `None` si el path intenta salir de la raíz o contiene un byte nulo.
///
/// # Ejemplo
/// ```
/// use mini_httpd::http::query::decode_path;
///
/// assert_eq!(decode_path("/docs/../index.html").as_deref(), Some("index.html"));
/// assert_eq!(decode_path("/../etc/passwd"), None);
/// ```
pub fn decode_path(raw: &str) -> Option<String> {
    let decoded = percent_decode(raw.as_bytes(), false);
    if decoded.contains(&0) {
        return None;
    }
    let decoded = String::from_utf8_lossy(&decoded);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    let mut path = segments.join("/");
    if !path.is_empty() && decoded.ends_with('/') {
        path.push('/');
    }
    Some(path)
}

/// Parámetros de una query string, en el orden original
///
/// Un parámetro sin `=` tiene nombre pero no valor (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryParams {
    /// Parsea una query string cruda (sin el `?`)
    ///
    /// Segmentos vacíos (`&&`, `&` final) se ignoran.
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::query::QueryParams;
    ///
    /// let params = QueryParams::parse("a=1&b=two%20words&flag");
    /// assert_eq!(params.len(), 3);
    /// assert_eq!(params.get("b"), Some("two words"));
    /// assert_eq!(params.value(2), None);
    /// ```
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|param| !param.is_empty())
            .map(|param| match param.split_once('=') {
                Some((name, value)) => (url_decode(name), Some(url_decode(value))),
                None => (url_decode(param), None),
            })
            .collect();

        Self { pairs }
    }

    /// Número de parámetros
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Nombre del parámetro en la posición `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.pairs.get(index).map(|(name, _)| name.as_str())
    }

    /// Valor del parámetro en la posición `index` (`None` si no tenía `=`)
    pub fn value(&self, index: usize) -> Option<&str> {
        self.pairs.get(index).and_then(|(_, value)| value.as_deref())
    }

    /// Valor de la primera ocurrencia de `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Itera los pares (nombre, valor) en orden
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }
}
