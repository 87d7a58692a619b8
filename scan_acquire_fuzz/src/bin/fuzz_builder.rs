use honggfuzz::fuzz;
use scan_acquire::build::ImageBuilder;
use scan_acquire::raster::ImageHolder;
use scan_acquire_fuzz::ScriptedScan;

fn main() {
    loop {
        fuzz!(|input: ScriptedScan| {
            if input.width == 0 {
                return;
            }
            let params = input.params();
            let holder = ImageHolder::new();
            let mut builder =
                ImageBuilder::new(&params, holder.clone(), input.height_hint.map(u32::from))
                    .unwrap();

            let mut height = holder.dimensions().unwrap().1;
            for chunk in input.chunks() {
                builder.feed(chunk).unwrap();
                let grown = holder.dimensions().unwrap().1;
                assert!(grown >= height);
                height = grown;
            }
            let final_height = builder.final_height();
            assert_eq!(final_height, input.expected_height());
            assert!(height >= final_height);

            if input.depth() != 16 {
                let raster = holder.snapshot().unwrap();
                assert_eq!(&raster.as_bytes()[..input.data.len()], input.data.as_slice());
            }
        });
    }
}
