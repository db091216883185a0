use quick_xml::events::BytesStart;

/// One XML element read out of the stream, with its full subtree.
///
/// Values are owned by whoever pulled them from [`crate::ElementStream`] and
/// are meant to be dropped once inspected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<RawElement>,
}

impl RawElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: RawElement) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn from_start(event: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut element = Self::new(String::from_utf8_lossy(event.name().as_ref()));
        for attr in event.attributes().with_checks(false) {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    pub(crate) fn push_child(&mut self, child: RawElement) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First value of the named attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn children(&self) -> &[RawElement] {
        &self.children
    }

    /// Direct children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}
