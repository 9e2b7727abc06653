use scraper::ElementRef;

/// Read-only element tree handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Tag>,
    /// Concatenated text of all descendants.
    pub text: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Appends a child element; its text is folded into this tag's text.
    pub fn with_child(mut self, child: Tag) -> Self {
        self.text.push_str(&child.text);
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            name: value.name().to_ascii_lowercase(),
            attributes: value
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            children: element
                .children()
                .filter_map(ElementRef::wrap)
                .map(Tag::from_element)
                .collect(),
            text: element.text().collect(),
        }
    }
}
