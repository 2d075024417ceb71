use minhton::LogicalPosition;
use proptest::prelude::*;

fn fanout_strategy() -> impl Strategy<Value = u8> {
    2u8..=8
}

proptest! {
    /// P1: every non-root position has exactly one parent, and that
    /// parent's child at the right index is the position itself.
    #[test]
    fn p1_parent_child_relationship_is_reciprocal(
        fanout in fanout_strategy(),
        level in 1u32..6,
        raw_number in any::<u128>(),
    ) {
        let capacity = (fanout as u128).pow(level);
        let number = raw_number % capacity;
        let position = LogicalPosition::new(level, number, fanout).unwrap();

        let parent = position.parent().expect("non-root always has a parent");
        let index = position.child_index().expect("non-root always has a child index");
        let reconstructed = parent.child(index).unwrap();

        prop_assert_eq!(reconstructed, position);
    }

    /// P3: a position's children all report it as their parent.
    #[test]
    fn p3_children_point_back_to_their_parent(
        fanout in fanout_strategy(),
        level in 0u32..5,
        raw_number in any::<u128>(),
    ) {
        let capacity = (fanout as u128).pow(level);
        let number = raw_number % capacity;
        let position = LogicalPosition::new(level, number, fanout).unwrap();

        for child in position.children().unwrap() {
            prop_assert_eq!(child.parent(), Some(position));
        }
    }

    /// P4: routing-table neighbors are always at the same level as self.
    #[test]
    fn p4_routing_table_neighbors_share_the_level(
        fanout in fanout_strategy(),
        level in 0u32..5,
        raw_number in any::<u128>(),
    ) {
        let capacity = (fanout as u128).pow(level);
        let number = raw_number % capacity;
        let position = LogicalPosition::new(level, number, fanout).unwrap();

        for neighbor in position.routing_table_neighbors() {
            prop_assert_eq!(neighbor.level(), level);
            prop_assert_eq!(neighbor.fanout(), fanout);
        }
    }
}
